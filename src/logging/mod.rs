// Logging module for structured logging using the tracing crate

use crate::config::{LogFormat, LoggingConfig};
use tracing_subscriber::EnvFilter;

/// Build the filter: `RUST_LOG` when set, otherwise the configured level.
pub fn env_filter(config: &LoggingConfig) -> Result<EnvFilter, String> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&config.level)
            .map_err(|e| format!("Invalid log level '{}': {}", config.level, e)),
    }
}

/// Initialize the tracing subscriber.
///
/// Logs go to stderr so rendered output can be piped from stdout. Calling
/// this more than once returns an error instead of replacing the first
/// subscriber.
///
/// # Examples
///
/// ```ignore
/// use sourceable::config::LoggingConfig;
/// use sourceable::logging::init_subscriber;
///
/// init_subscriber(&LoggingConfig::default())?;
/// tracing::info!("Application started");
/// ```
pub fn init_subscriber(config: &LoggingConfig) -> Result<(), String> {
    let filter = env_filter(config)?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true);

    let result = match config.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
    };
    result.map_err(|e| format!("Failed to initialize logging: {}", e))
}
