//! Subscriber setup for `tracing` output.
//!
//! The filter comes from `PAGECHECK_LOG`, then `RUST_LOG`, then the
//! `default_level` argument. Installing twice is a no-op, so every test may
//! call [`init`].

use tracing_subscriber::EnvFilter;

/// Environment variable read before `RUST_LOG`
pub const LOG_ENV: &str = "PAGECHECK_LOG";

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Compact human-readable lines
    #[default]
    Compact,
    /// One JSON object per event
    Json,
}

/// Build the filter: `PAGECHECK_LOG`, `RUST_LOG`, then `default_level`
#[must_use]
pub fn filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Install a stderr subscriber; returns false if one was already set
pub fn init_with(default_level: &str, format: LogFormat) -> bool {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter(default_level))
        .with_writer(std::io::stderr)
        .with_target(true);
    match format {
        LogFormat::Compact => builder.compact().try_init().is_ok(),
        LogFormat::Json => builder.json().try_init().is_ok(),
    }
}

/// Install a compact subscriber at `warn` unless overridden
pub fn init() -> bool {
    init_with("warn", LogFormat::Compact)
}
