//! Error types and result aliases for chronicle.
//!
//! This module defines the shared error types used by the storage and
//! primitive layers. Errors are structured for programmatic handling and
//! include context for debugging.

use std::fmt;

/// The result type used throughout chronicle-core.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in chronicle-core operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An invalid identifier was provided.
    #[error("invalid identifier: {message}")]
    InvalidId {
        /// Description of what made the ID invalid.
        message: String,
    },

    /// A sink open, write, or close operation failed.
    #[error("sink I/O error: {message}")]
    SinkIo {
        /// Description of the I/O failure.
        message: String,
        /// The underlying cause, if any.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The destination already holds an artifact and overwrite was not requested.
    #[error("destination already exists: {0}")]
    AlreadyExists(String),

    /// A path or object was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Invalid input was provided.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A serialization or deserialization error occurred.
    #[error("serialization error: {message}")]
    Serialization {
        /// Description of the serialization failure.
        message: String,
    },

    /// The operation was cancelled cooperatively.
    #[error("operation cancelled")]
    Cancelled,

    /// An internal error occurred that should not happen in normal operation.
    #[error("internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

impl Error {
    /// Creates a new sink I/O error with the given message.
    #[must_use]
    pub fn sink_io(message: impl Into<String>) -> Self {
        Self::SinkIo {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new sink I/O error with a source cause.
    #[must_use]
    pub fn sink_io_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::SinkIo {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a new invalid identifier error.
    #[must_use]
    pub fn invalid_id(message: impl fmt::Display) -> Self {
        Self::InvalidId {
            message: message.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as StdError;

    #[test]
    fn sink_io_error_with_source() {
        let source = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = Error::sink_io_with_source("failed to create archive file", source);
        assert!(err.to_string().contains("sink I/O error"));
        assert!(StdError::source(&err).is_some());
    }

    #[test]
    fn sink_io_error_without_source() {
        let err = Error::sink_io("write rejected");
        assert!(StdError::source(&err).is_none());
    }

    #[test]
    fn cancelled_display() {
        assert_eq!(Error::Cancelled.to_string(), "operation cancelled");
    }
}
