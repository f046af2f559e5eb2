// Error types for singleton construction and demo configuration.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SingletonError {
    #[error("construction was cancelled before the instance became ready")]
    Cancelled,

    #[error("construction failed: {reason}")]
    ConstructionFailed { reason: String },

    #[error("no provider registered for type `{type_name}`")]
    NotRegistered { type_name: &'static str },

    #[error("a provider for type `{type_name}` is already registered")]
    AlreadyRegistered { type_name: &'static str },
}

impl SingletonError {
    pub fn construction_failed(reason: impl Into<String>) -> Self {
        Self::ConstructionFailed {
            reason: reason.into(),
        }
    }

    /// Whether a later call to the accessor may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ConstructionFailed { .. })
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value for field '{field}': {reason}")]
    Invalid { field: String, reason: String },

    #[error("unknown strategy '{0}' (expected unsynchronized, synchronized, double-checked or eager)")]
    UnknownStrategy(String),
}

impl ConfigError {
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
