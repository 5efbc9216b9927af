//! Core error types

use thiserror::Error;

/// Errors raised while parsing or converting core values
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("Unsupported color syntax: {0}")]
    InvalidColor(String),

    #[error("Invalid percentage: {0}")]
    InvalidPercent(String),

    #[error("Invalid value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },
}

/// Result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
