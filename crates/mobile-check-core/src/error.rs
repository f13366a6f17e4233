//! Error types for the Mobile Check service.

use thiserror::Error;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for the Mobile Check service.
#[derive(Error, Debug)]
pub enum Error {
    /// The endpoint does not accept this HTTP method.
    #[error("Method not allowed: {method}")]
    MethodNotAllowed {
        /// The rejected method.
        method: String,
    },

    /// A required request input was absent.
    #[error("Missing input: {field}")]
    MissingInput {
        /// Name of the missing field.
        field: String,
    },

    /// Request input was present but could not be interpreted.
    #[error("Invalid payload: {message}")]
    InvalidPayload {
        /// Description of the problem.
        message: String,
    },

    /// No payload is stored under the identifier.
    #[error("Data not found: {id}")]
    NotFound {
        /// The requested identifier.
        id: String,
    },

    /// Invalid configuration provided.
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the configuration error.
        message: String,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal error (unexpected state).
    #[error("Internal error: {message}")]
    Internal {
        /// Error message.
        message: String,
    },
}

/// Coarse classification of an [`Error`], as surfaced to HTTP callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Wrong HTTP verb.
    BadMethod,
    /// Absent or malformed input.
    MissingInput,
    /// Unknown identifier.
    NotFound,
    /// Anything the caller cannot fix.
    Internal,
}

impl Error {
    /// Returns the kind of failure this error represents.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MethodNotAllowed { .. } => ErrorKind::BadMethod,
            Self::MissingInput { .. } | Self::InvalidPayload { .. } => ErrorKind::MissingInput,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::InvalidConfig { .. }
            | Self::Io(_)
            | Self::Serialization(_)
            | Self::Internal { .. } => ErrorKind::Internal,
        }
    }

    /// Returns `true` if the caller sent something the service cannot act on.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        !matches!(self.kind(), ErrorKind::Internal)
    }

    /// Creates a missing input error for the named field.
    #[must_use]
    pub fn missing(field: impl Into<String>) -> Self {
        Self::MissingInput {
            field: field.into(),
        }
    }

    /// Creates an invalid payload error.
    #[must_use]
    pub fn invalid_payload(message: impl Into<String>) -> Self {
        Self::InvalidPayload {
            message: message.into(),
        }
    }

    /// Creates a not found error for the given identifier.
    #[must_use]
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    /// Creates an internal error with the given message.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            Error::MethodNotAllowed {
                method: "PUT".into()
            }
            .kind(),
            ErrorKind::BadMethod
        );
        assert_eq!(Error::missing("data").kind(), ErrorKind::MissingInput);
        assert_eq!(Error::invalid_payload("bad").kind(), ErrorKind::MissingInput);
        assert_eq!(Error::not_found("abc").kind(), ErrorKind::NotFound);
        assert_eq!(Error::internal("boom").kind(), ErrorKind::Internal);

        let parse_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert_eq!(Error::from(parse_err).kind(), ErrorKind::Internal);
    }

    #[test]
    fn test_client_error() {
        assert!(Error::not_found("abc").is_client_error());
        assert!(!Error::internal("boom").is_client_error());
    }
}
