//! Logging initialization.
//!
//! Diagnostics go to stderr so stdout stays a clean stream of records. The
//! filter comes from `RUST_LOG` when set, otherwise from `BEACON_LOG_LEVEL`,
//! otherwise a default chosen by the caller.

use thiserror::Error;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Environment variable consulted when `RUST_LOG` is unset.
pub const LOG_LEVEL_ENV: &str = "BEACON_LOG_LEVEL";

/// Errors raised while installing the subscriber.
#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("Invalid log filter: {0}")]
    Filter(#[from] ParseError),
    #[error("Logging already initialized: {0}")]
    Init(#[from] TryInitError),
}

/// Build the env filter, falling back to `default_level`.
pub fn env_filter(default_level: &str) -> Result<EnvFilter, ParseError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    let level = std::env::var(LOG_LEVEL_ENV).unwrap_or_else(|_| default_level.to_string());
    EnvFilter::try_new(level)
}

/// Install a compact stderr subscriber.
///
/// # Errors
/// Returns an error if the filter cannot be parsed or a global subscriber is
/// already installed.
pub fn init(default_level: &str) -> Result<(), LoggingError> {
    let stderr_layer = tracing_subscriber::fmt::layer()
        .compact()
        .with_writer(std::io::stderr)
        .with_target(true);

    tracing_subscriber::registry()
        .with(env_filter(default_level)?)
        .with(stderr_layer)
        .try_init()?;

    Ok(())
}
