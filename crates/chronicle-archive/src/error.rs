//! Error types for the archive domain.

/// The result type used throughout chronicle-archive.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in archive operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Paging the committed event stream failed.
    #[error("source read error: {message}")]
    SourceRead {
        /// Description of the paging failure.
        message: String,
        /// The underlying cause, if any.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Archive bytes could not be decoded back into event records.
    #[error("archive format corruption: {message}")]
    FormatCorruption {
        /// Description of what made the archive undecodable.
        message: String,
    },

    /// A write session was used after it was finished.
    #[error("invalid session state: {message}")]
    InvalidSessionState {
        /// Description of the invalid use.
        message: String,
    },

    /// No decoder is registered for an event type.
    #[error("unknown event type: {name} v{version}")]
    UnknownEventType {
        /// The event type name that was looked up.
        name: String,
        /// The event version that was looked up.
        version: u32,
    },

    /// An event type was registered twice.
    #[error("duplicate event type registration: {name} v{version}")]
    DuplicateEventType {
        /// The event type name registered twice.
        name: String,
        /// The event version registered twice.
        version: u32,
    },

    /// A serialization error occurred.
    #[error("serialization error: {message}")]
    Serialization {
        /// Description of the serialization failure.
        message: String,
    },

    /// The operation was cancelled cooperatively.
    #[error("operation cancelled")]
    Cancelled,

    /// An error from chronicle-core.
    #[error("core error: {0}")]
    Core(#[source] chronicle_core::Error),
}

impl Error {
    /// Creates a new source read error.
    #[must_use]
    pub fn source_read(message: impl Into<String>) -> Self {
        Self::SourceRead {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new source read error with a source cause.
    #[must_use]
    pub fn source_read_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::SourceRead {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a new format corruption error.
    #[must_use]
    pub fn format_corruption(message: impl Into<String>) -> Self {
        Self::FormatCorruption {
            message: message.into(),
        }
    }

    /// Whether this error reports cooperative cancellation.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

// Core cancellation is normalized into the domain `Cancelled` variant so
// callers match on a single error kind regardless of which layer observed
// the token.
impl From<chronicle_core::Error> for Error {
    fn from(err: chronicle_core::Error) -> Self {
        match err {
            chronicle_core::Error::Cancelled => Self::Cancelled,
            other => Self::Core(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as StdError;

    #[test]
    fn core_cancellation_is_normalized() {
        let err = Error::from(chronicle_core::Error::Cancelled);
        assert!(err.is_cancelled());
    }

    #[test]
    fn core_errors_keep_their_source_chain() {
        let err = Error::from(chronicle_core::Error::sink_io("disk full"));
        assert!(matches!(err, Error::Core(_)));
        assert!(StdError::source(&err).is_some());
    }

    #[test]
    fn unknown_event_type_display() {
        let err = Error::UnknownEventType {
            name: "thingy-ping".into(),
            version: 2,
        };
        assert_eq!(err.to_string(), "unknown event type: thingy-ping v2");
    }
}
