//! Log subscriber configuration.

use shopseeker_core::{config::TelemetryConfig, Error, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global subscriber: env filter plus plain or JSON output.
///
/// `RUST_LOG` overrides the configured filter. Logs go to stderr so they
/// never mix with the result output on stdout.
pub fn configure_tracing(config: &TelemetryConfig) -> Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(&config.log_filter))
        .map_err(|e| Error::config(format!("Invalid log filter {:?}: {}", config.log_filter, e)))?;

    let registry = tracing_subscriber::registry().with(env_filter);

    let result = if config.json_logs {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
    };

    result.map_err(|e| Error::internal(format!("Failed to install tracing subscriber: {}", e)))
}
