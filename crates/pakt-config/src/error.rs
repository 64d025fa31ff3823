//! Error types for configuration loading and validation.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for `{field}`: {value} ({hint})")]
    InvalidValue {
        field: String,
        value: String,
        hint: String,
    },

    #[error("missing value for `{field}`: {hint}")]
    MissingField { field: String, hint: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
