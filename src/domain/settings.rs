//! Resolved journal settings.

use std::path::PathBuf;

use crate::domain::merge::MergePolicy;
use crate::ports::config_port::ConfigPort;

pub const DEFAULT_ACCOUNT: &str = "main";
pub const DEFAULT_LISTEN: &str = "127.0.0.1:3000";

#[derive(Debug, Clone, PartialEq)]
pub struct MirrorSettings {
    pub path: PathBuf,
    pub pool_size: u32,
    pub merge_policy: MergePolicy,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JournalSettings {
    pub data_dir: PathBuf,
    pub default_account: String,
    pub mirror: Option<MirrorSettings>,
    pub template_path: Option<PathBuf>,
    pub recent_trades: usize,
    pub listen: String,
}

impl JournalSettings {
    /// Assumes the config already passed `validate_journal_config`.
    pub fn from_config(config: &dyn ConfigPort) -> Self {
        let mirror = if config.get_bool("mirror", "enabled", false) {
            config.get_string("mirror", "path").map(|path| MirrorSettings {
                path: PathBuf::from(path),
                pool_size: config.get_int("mirror", "pool_size", 4).clamp(1, 64) as u32,
                merge_policy: config
                    .get_string("mirror", "merge_policy")
                    .and_then(|p| p.parse().ok())
                    .unwrap_or_default(),
            })
        } else {
            None
        };

        JournalSettings {
            data_dir: PathBuf::from(
                config
                    .get_string("journal", "data_dir")
                    .unwrap_or_else(|| "journal".to_string()),
            ),
            default_account: config
                .get_string("journal", "default_account")
                .unwrap_or_else(|| DEFAULT_ACCOUNT.to_string()),
            mirror,
            template_path: config.get_string("report", "template_path").map(PathBuf::from),
            recent_trades: config
                .get_int(
                    "report",
                    "recent_trades",
                    crate::domain::dashboard::DEFAULT_RECENT_TRADES as i64,
                )
                .max(0) as usize,
            listen: config
                .get_string("web", "listen")
                .unwrap_or_else(|| DEFAULT_LISTEN.to_string()),
        }
    }

    /// The explicit account if given, otherwise the configured default.
    pub fn resolve_account(&self, explicit: Option<&str>) -> String {
        explicit
            .map(str::to_string)
            .unwrap_or_else(|| self.default_account.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    #[test]
    fn from_config_full() {
        let config = FileConfigAdapter::from_string(
            r#"
[journal]
data_dir = /var/lib/journal
default_account = futures

[mirror]
enabled = true
path = /var/lib/journal/mirror.db
pool_size = 2
merge_policy = prefer-remote

[report]
template_path = custom.typ
recent_trades = 25

[web]
listen = 0.0.0.0:8080
"#,
        )
        .unwrap();
        let settings = JournalSettings::from_config(&config);
        assert_eq!(settings.data_dir, PathBuf::from("/var/lib/journal"));
        assert_eq!(settings.default_account, "futures");
        let mirror = settings.mirror.unwrap();
        assert_eq!(mirror.path, PathBuf::from("/var/lib/journal/mirror.db"));
        assert_eq!(mirror.pool_size, 2);
        assert_eq!(mirror.merge_policy, MergePolicy::PreferRemote);
        assert_eq!(settings.template_path, Some(PathBuf::from("custom.typ")));
        assert_eq!(settings.recent_trades, 25);
        assert_eq!(settings.listen, "0.0.0.0:8080");
    }

    #[test]
    fn from_config_defaults() {
        let config = FileConfigAdapter::from_string("[journal]\ndata_dir = data\n").unwrap();
        let settings = JournalSettings::from_config(&config);
        assert_eq!(settings.default_account, DEFAULT_ACCOUNT);
        assert!(settings.mirror.is_none());
        assert!(settings.template_path.is_none());
        assert_eq!(settings.recent_trades, 10);
        assert_eq!(settings.listen, DEFAULT_LISTEN);
    }

    #[test]
    fn resolve_account_prefers_explicit() {
        let config = FileConfigAdapter::from_string("[journal]\ndata_dir = data\n").unwrap();
        let settings = JournalSettings::from_config(&config);
        assert_eq!(settings.resolve_account(Some("swing")), "swing");
        assert_eq!(settings.resolve_account(None), "main");
    }
}
