//! Error types for config loading and validation.

use thiserror::Error;

/// Failures while reading, parsing, or validating a config.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Reading a config file failed.
    #[error("failed to read config: {0}")]
    ReadFailed(#[from] std::io::Error),
    /// Parsing a config file failed.
    #[error("failed to parse config: {0}")]
    ParseFailed(#[from] json5::Error),
    /// One field holds an out-of-range or inconsistent value.
    #[error("invalid config at {path}: {message}")]
    InvalidField { path: String, message: String },
}

impl ConfigError {
    pub(crate) fn field(path: &str, message: impl Into<String>) -> Self {
        Self::InvalidField {
            path: path.to_string(),
            message: message.into(),
        }
    }
}
