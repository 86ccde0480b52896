//! Error handling for AFRBKit
//!
//! Provides error types for the toolpath pipeline:
//! - Toolpath errors (file access and streaming reads)
//! - Configuration errors (invalid pipeline parameters)
//!
//! Malformed G-code is never an error: unrecognised lines and bad numeric
//! words are skipped by the tokenizer. Only the caller's side of the
//! contract (paths, readable files, sane parameters) can fail.
//!
//! All error types use `thiserror` for ergonomic error handling.

use std::path::PathBuf;
use thiserror::Error;

/// Toolpath pipeline error type
///
/// Represents failures while opening or streaming a G-code source.
#[derive(Error, Debug)]
pub enum ToolpathError {
    /// The G-code file could not be opened or inspected
    #[error("Cannot access G-code file {path:?}: {source}")]
    FileAccess {
        /// The offending path.
        path: PathBuf,
        /// The underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The path exists but is not a regular file
    #[error("Path is not a file: {path:?}")]
    NotAFile {
        /// The offending path.
        path: PathBuf,
    },

    /// A read failed part-way through the stream
    #[error("Read failed after line {line_number}: {source}")]
    Read {
        /// Number of lines successfully read before the failure.
        line_number: u64,
        /// The underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
}

/// Configuration error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// A parameter is outside its valid range
    #[error("Invalid value for '{key}': {reason}")]
    InvalidValue {
        /// The parameter name.
        key: String,
        /// Why the value was rejected.
        reason: String,
    },
}

impl ConfigError {
    /// Shorthand for [`ConfigError::InvalidValue`]
    pub fn invalid(key: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

/// Main error type for AFRBKit
///
/// A unified error type that can represent any error from the library
/// crates. This is the primary error type used in public APIs.
#[derive(Error, Debug)]
pub enum Error {
    /// Toolpath error
    #[error(transparent)]
    Toolpath(#[from] ToolpathError),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Check if this is a file access error
    pub fn is_file_access(&self) -> bool {
        matches!(
            self,
            Error::Toolpath(ToolpathError::FileAccess { .. })
                | Error::Toolpath(ToolpathError::NotAFile { .. })
        )
    }

    /// Check if this is a configuration error
    pub fn is_config_error(&self) -> bool {
        matches!(self, Error::Config(_))
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;
