//! Diagnostic logging setup.
//!
//! User-facing output goes straight to stdout/stderr from the CLI; this only
//! configures `tracing` diagnostics, which are written to stderr.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter directive for a `-v` count. `RUST_LOG` overrides it.
pub fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info,tradejournal=debug",
        _ => "debug,tradejournal=trace",
    }
}

/// Installs the global subscriber. Returns `false` if one was already set.
pub fn init_logging(verbosity: u8) -> bool {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(verbosity > 1),
        )
        .try_init()
        .is_ok()
}
