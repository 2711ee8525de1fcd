//! Error types shared across mediadrop crates

use thiserror::Error;

/// Result type alias for common operations
pub type Result<T> = std::result::Result<T, CommonError>;

/// Main error type for the common crate
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommonError {
    #[error("quality must be one of: {allowed}; got '{value}'")]
    InvalidQuality { value: String, allowed: String },

    #[error("format must be '{expected}'; got '{value}'")]
    UnsupportedFormat { value: String, expected: String },
}
