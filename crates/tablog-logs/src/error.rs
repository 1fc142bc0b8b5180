//! Error types for the tablog engine.
//!
//! Classification and filtering never fail; every variant here belongs to a
//! boundary: rule construction, line sources, configuration, or indexed access.

use thiserror::Error;

use tablog_types::SeverityLevel;

/// The main error type for tablog operations
#[derive(Error, Debug)]
pub enum LogError {
    /// A general rule failed to compile. Reported as a diagnostic, never fatal.
    #[error("Invalid {level} pattern '{pattern}': {source}")]
    InvalidPattern {
        level: SeverityLevel,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// Store or filtered view accessed past its end
    #[error("Index {index} out of range (count {count})")]
    OutOfRange { index: usize, count: usize },

    /// The line source could not supply lines
    #[error("{message}: '{source_name}'")]
    SourceUnavailable {
        source_name: String,
        message: String,
    },

    /// Rule configuration could not be read or parsed
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Underlying IO failure
    #[error("IO operation failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Standard Result type for tablog operations
pub type Result<T> = std::result::Result<T, LogError>;

impl LogError {
    pub fn out_of_range(index: usize, count: usize) -> Self {
        Self::OutOfRange { index, count }
    }

    pub fn source_unavailable(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SourceUnavailable {
            source_name: source_name.into(),
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}
