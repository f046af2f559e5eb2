// Stderr subscriber for the crate's tracing events.
// The filter comes from the LOG environment variable (e.g. `LOG=debug` or
// `LOG=singleton_catalog::strategy=trace`); logging is off when unset.

use thiserror::Error;
use tracing_subscriber::filter::{EnvFilter, ParseError};
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};

pub const FILTER_ENV: &str = "LOG";

#[derive(Debug, Error)]
pub enum LoggerError {
    #[error("invalid log filter: {0}")]
    Filter(#[from] ParseError),

    #[error("failed to install subscriber: {0}")]
    Init(#[from] TryInitError),
}

/// Filter from `LOG`, or one that disables every event when it is unset.
pub fn filter_from_env() -> Result<EnvFilter, LoggerError> {
    match std::env::var(FILTER_ENV) {
        Ok(directives) => Ok(EnvFilter::try_new(directives)?),
        Err(_) => Ok(EnvFilter::new("off")),
    }
}

/// Installs the global subscriber. Fails if one is already installed.
pub fn init() -> Result<(), LoggerError> {
    init_with_filter(filter_from_env()?)
}

pub fn init_with_filter(filter: EnvFilter) -> Result<(), LoggerError> {
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_thread_names(true)
        .with_target(false)
        .finish()
        .try_init()?;
    Ok(())
}
