//! Typst dashboard report.
//!
//! Reads a Typst template (the built-in default or a custom file from
//! `[report] template_path`), resolves every `{{PLACEHOLDER}}` marker from a
//! [`Dashboard`] using `tables` and `chart_svg`, and writes the `.typ` file.

pub mod chart_svg;
pub mod default_template;
pub mod tables;

use std::path::PathBuf;
use tracing::debug;

use crate::domain::dashboard::Dashboard;
use crate::domain::error::JournalError;
use crate::ports::report_port::ReportPort;

/// Wraps an SVG string in a Typst `image.decode` call.
fn embed_svg(svg: &str, empty_message: &str) -> String {
    if svg.is_empty() {
        format!("_{}_", empty_message)
    } else {
        format!(
            "#image.decode(\n\"{}\",\n  width: 100%,\n)",
            svg.replace('\\', "\\\\").replace('"', "\\\"")
        )
    }
}

/// Resolve all `{{PLACEHOLDER}}`s in the given template string.
pub fn resolve(template: &str, dashboard: &Dashboard) -> String {
    let mut output = template.to_string();

    output = output.replace(
        "{{ACCOUNT_SUMMARY}}",
        &tables::render_account_summary(&dashboard.ledger, dashboard.as_of),
    );
    output = output.replace("{{STATS_TABLE}}", &tables::render_stats_table(&dashboard.stats));
    output = output.replace("{{RISK_TABLE}}", &tables::render_risk_table(&dashboard.risk));
    output = output.replace(
        "{{STREAKS_TABLE}}",
        &tables::render_streaks_table(&dashboard.streaks),
    );
    output = output.replace(
        "{{ACHIEVEMENTS}}",
        &tables::render_achievements(&dashboard.achievements),
    );

    // Equity curve followed by daily P/L bars
    let equity = embed_svg(
        &chart_svg::generate_equity_svg(&dashboard.equity_curve()),
        "No equity data.",
    );
    let daily = embed_svg(
        &chart_svg::generate_daily_pnl_svg(&dashboard.ledger.daily_pnl()),
        "No trading days yet.",
    );
    output = output.replace("{{EQUITY_CURVE_SVG}}", &format!("{}\n\n{}", equity, daily));

    output = output.replace(
        "{{INSTRUMENT_TABLE}}",
        &tables::render_instrument_table(&dashboard.instruments),
    );
    output = output.replace("{{FLAG_TABLE}}", &tables::render_flag_table(&dashboard.flags));
    output = output.replace(
        "{{TRADE_LOG}}",
        &tables::render_trade_log(&dashboard.ledger.trades),
    );
    output = output.replace(
        "{{MONTHLY_PNL}}",
        &tables::render_monthly_pnl(&tables::compute_monthly_pnl(&dashboard.ledger)),
    );

    output
}

#[derive(Debug, Clone, Default)]
pub struct TypstReportAdapter {
    template_path: Option<PathBuf>,
}

impl TypstReportAdapter {
    pub fn new(template_path: Option<PathBuf>) -> Self {
        Self { template_path }
    }

    fn load_template(&self) -> Result<String, JournalError> {
        match &self.template_path {
            Some(path) => std::fs::read_to_string(path).map_err(|e| JournalError::Report {
                reason: format!("failed to read template {}: {}", path.display(), e),
            }),
            None => Ok(default_template::template().to_string()),
        }
    }
}

impl ReportPort for TypstReportAdapter {
    fn render(&self, dashboard: &Dashboard) -> Result<String, JournalError> {
        let template = self.load_template()?;
        debug!(
            account = %dashboard.account().name,
            custom_template = self.template_path.is_some(),
            "rendering typst report"
        );
        Ok(resolve(&template, dashboard))
    }

    fn write(&self, dashboard: &Dashboard, output_path: &str) -> Result<(), JournalError> {
        let content = self.render(dashboard)?;
        let path = std::path::Path::new(output_path);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| JournalError::Report {
                reason: format!("failed to create {}: {}", parent.display(), e),
            })?;
        }
        std::fs::write(path, content).map_err(|e| JournalError::Report {
            reason: format!("failed to write {output_path}: {e}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::account::Account;
    use crate::domain::risk::RiskPlan;
    use crate::domain::trade::{Direction, RiskFlag, TradeEntry};
    use chrono::NaiveDate;
    use std::collections::BTreeSet;
    use tempfile::TempDir;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    fn sample_dashboard(with_trades: bool) -> Dashboard {
        let account = Account::new("futures", 20_000.0, date(1)).unwrap();
        let trades = if with_trades {
            let mut flagged = BTreeSet::new();
            flagged.insert(RiskFlag::Oversized);
            vec![
                TradeEntry {
                    id: 1,
                    date: date(2),
                    instrument: "ES".into(),
                    direction: Direction::Long,
                    pnl: 5_000.0,
                    risk: 200.0,
                    flags: BTreeSet::new(),
                    feedback: "Clean breakout".into(),
                },
                TradeEntry {
                    id: 2,
                    date: date(3),
                    instrument: "CL".into(),
                    direction: Direction::Short,
                    pnl: -800.0,
                    risk: 200.0,
                    flags: flagged,
                    feedback: "Size was 3x plan".into(),
                },
            ]
        } else {
            Vec::new()
        };
        Dashboard::build(account, trades, &RiskPlan::new(20_000.0, 0.01), date(3))
    }

    #[test]
    fn resolve_default_template_no_placeholders_remain() {
        let output = resolve(default_template::template(), &sample_dashboard(true));
        assert!(!output.contains("{{"), "unresolved placeholder in output");
    }

    #[test]
    fn resolve_produces_typst_content() {
        let output = resolve(default_template::template(), &sample_dashboard(true));
        assert!(output.contains("#set page("));
        assert!(output.contains("#table("));
        assert!(output.contains("futures"));
        assert!(output.contains("Oversized position"));
        assert!(output.contains("#image.decode("));
        assert!(output.contains("21.00%"));
    }

    #[test]
    fn resolve_empty_account() {
        let output = resolve(default_template::template(), &sample_dashboard(false));
        assert!(!output.contains("{{"));
        assert!(output.contains("No trades logged"));
        assert!(output.contains("No trading days yet."));
    }

    #[test]
    fn resolve_custom_template() {
        let custom = "= My Journal\n{{ACCOUNT_SUMMARY}}\n{{RISK_TABLE}}";
        let output = resolve(custom, &sample_dashboard(true));
        assert!(output.starts_with("= My Journal"));
        assert!(output.contains("Risk per Trade"));
        assert!(!output.contains("{{"));
    }

    #[test]
    fn adapter_reads_custom_template_file() {
        let dir = TempDir::new().unwrap();
        let template = dir.path().join("mine.typ");
        std::fs::write(&template, "Custom {{STREAKS_TABLE}}").unwrap();
        let adapter = TypstReportAdapter::new(Some(template));
        let out = adapter.render(&sample_dashboard(true)).unwrap();
        assert!(out.starts_with("Custom #table("));
    }

    #[test]
    fn adapter_missing_template_is_report_error() {
        let adapter = TypstReportAdapter::new(Some(PathBuf::from("/nonexistent/t.typ")));
        assert!(matches!(
            adapter.render(&sample_dashboard(true)),
            Err(JournalError::Report { .. })
        ));
    }

    #[test]
    fn adapter_write_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("reports/may/futures.typ");
        TypstReportAdapter::default()
            .write(&sample_dashboard(true), out.to_str().unwrap())
            .unwrap();
        let content = std::fs::read_to_string(out).unwrap();
        assert!(content.contains("= Trading Journal"));
    }
}
