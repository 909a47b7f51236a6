//! Error types for leadkit.
//!
//! Library crates use [`LeadkitError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all leadkit operations.
#[derive(Debug, thiserror::Error)]
pub enum LeadkitError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// CSV input was empty or whitespace only.
    #[error("CSV content cannot be empty")]
    EmptyInput,

    /// CSV input parsed to zero data rows.
    #[error("CSV file appears to be empty or contains no valid data")]
    NoData,

    /// Delimiter, quoting, or field-count error in the CSV text.
    #[error("CSV parsing failed: {message}")]
    CsvStructure { message: String },

    /// Request-level validation error (empty batch, blank template, ...).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// None of the requested records exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Database or storage layer error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Gender inference service error.
    #[error("gender lookup error: {0}")]
    Lookup(String),

    /// Email-verification workflow error.
    #[error("email verification error: {0}")]
    Verification(String),

    /// Network/HTTP transport error.
    #[error("network error: {0}")]
    Network(String),

    /// Message template rendering error.
    #[error("template error: {message}")]
    Template { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, LeadkitError>;

impl LeadkitError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a CSV structural error from the underlying parser message.
    pub fn csv_structure(msg: impl Into<String>) -> Self {
        Self::CsvStructure {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Create a template error from any displayable message.
    pub fn template(msg: impl Into<String>) -> Self {
        Self::Template {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
