//! Tracing subscriber setup

use crate::{config::LoggingConfig, Error, Result};
use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber
///
/// `RUST_LOG` wins over the configured filter when set. Fails if the filter
/// does not parse or a global subscriber is already installed.
pub fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let filter = match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(directives) => EnvFilter::try_new(directives),
        Err(_) => EnvFilter::try_new(&logging.filter),
    }
    .map_err(|e| Error::Config(format!("Invalid log filter: {}", e)))?;

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let installed = if logging.json {
        builder.json().with_current_span(true).try_init()
    } else {
        builder.with_target(true).try_init()
    };

    installed.map_err(|e| Error::Config(format!("Failed to install subscriber: {}", e)))
}
