//! Error types

use thiserror::Error;

/// Failure to load preferences
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read preferences: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed preferences: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid preference {field}: {message}")]
    Invalid {
        field: &'static str,
        message: String,
    },
}
