//! `tracing` subscriber setup

use nimbus_domain::{LoggingConfig, NimbusError, Result};
use tracing_subscriber::EnvFilter;

/// Filter from `RUST_LOG` when set, otherwise from `level`
///
/// An unparsable `level` falls back to `info`.
pub fn build_filter(level: &str) -> EnvFilter {
    if std::env::var(EnvFilter::DEFAULT_ENV).is_ok() {
        return EnvFilter::from_default_env();
    }
    EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber
///
/// Logs go to stderr so command output on stdout stays clean.
///
/// # Errors
/// Returns `NimbusError::Config` if a global subscriber is already set.
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(build_filter(&config.level))
        .with_target(false)
        .with_writer(std::io::stderr);

    let installed = if config.json {
        builder.json().try_init()
    } else {
        builder.compact().try_init()
    };

    installed.map_err(|e| NimbusError::Config(format!("Failed to initialise logging: {e}")))
}
