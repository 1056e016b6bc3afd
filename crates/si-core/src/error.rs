//! # Error Types
//!
//! Every terminal outcome of the resource protocol other than success is a
//! [`ProtocolError`]. Each variant belongs to exactly one [`ErrorCategory`],
//! which decides how the outcome is surfaced and whether it is logged:
//!
//! | Category       | Cause          | Logged as anomaly |
//! |----------------|----------------|-------------------|
//! | `Validation`   | client         | no                |
//! | `Precondition` | client         | no                |
//! | `NotFound`     | normal outcome | no                |
//! | `Internal`     | server         | yes               |
//!
//! Backend failures ([`StoreError`]) and validator malfunctions
//! ([`ValidatorFault`]) are collaborator errors; the protocol converts both
//! into [`ProtocolError::Internal`].

use thiserror::Error;

/// Error raised by a [`ResourceStore`](crate::store::ResourceStore) backend.
///
/// "Not found" is never an error: `get` returns `Ok(None)` and `delete`
/// returns `Ok(false)`.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The backend could not be reached or refused the operation.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The content exceeds the backend's documented size ceiling.
    #[error("content of {actual} bytes exceeds the store limit of {limit} bytes")]
    ContentTooLarge {
        /// Backend ceiling in bytes.
        limit: usize,
        /// Size of the rejected content in bytes.
        actual: usize,
    },

    /// A stored record could not be decoded.
    #[error("stored record for '{identifier}' is corrupted: {reason}")]
    Corrupted {
        /// Identifier of the unreadable record.
        identifier: String,
        /// Decoder diagnostic.
        reason: String,
    },
}

/// The body validator itself failed, as opposed to rejecting the body.
#[derive(Error, Debug)]
#[error("body validator failed: {0}")]
pub struct ValidatorFault(pub String);

/// How a [`ProtocolError`] is surfaced to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Malformed request shape. Client-caused, never retried by the server.
    Validation,
    /// Missing or mismatched `If-Match`. The client should re-fetch and retry.
    Precondition,
    /// The identifier does not name a resource.
    NotFound,
    /// Backend failure, validator malfunction, or post-write inconsistency.
    Internal,
}

impl ErrorCategory {
    /// Returns the category identifier string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Precondition => "precondition",
            Self::NotFound => "not_found",
            Self::Internal => "internal",
        }
    }
}

/// Terminal failure of a GET, PUT, or DELETE.
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// The path named no identifier after the prefix was stripped.
    #[error("Resource name cannot be empty")]
    EmptyIdentifier,

    /// `Accept` is missing or not exactly the configured media type.
    #[error("Accept header must be \"{expected}\"")]
    InvalidAccept {
        /// The configured media type.
        expected: String,
    },

    /// `Content-Type` is missing or does not start with the media type.
    #[error("Content-Type header must be \"{expected}\"")]
    InvalidContentType {
        /// The configured media type.
        expected: String,
    },

    /// The body was rejected by the schema predicate.
    #[error("Request body does not match schema: {reason}")]
    InvalidBody {
        /// Validator diagnostic, safe to show to the client.
        reason: String,
    },

    /// The body exceeds the store's documented content ceiling.
    #[error("Request body of {actual} bytes exceeds the limit of {limit} bytes")]
    ContentTooLarge {
        /// Store ceiling in bytes.
        limit: usize,
        /// Body size in bytes.
        actual: usize,
    },

    /// Update of an existing resource without `If-Match`.
    #[error("If-Match header missing")]
    PreconditionHeaderMissing,

    /// `If-Match` does not name the current tag.
    #[error("ETag mismatch")]
    PreconditionFailed,

    /// No resource under this identifier.
    #[error("Resource not found")]
    NotFound,

    /// Server-side failure. The message is for operators, not clients.
    #[error("{0}")]
    Internal(String),
}

impl ProtocolError {
    /// The category this error belongs to.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::EmptyIdentifier
            | Self::InvalidAccept { .. }
            | Self::InvalidContentType { .. }
            | Self::InvalidBody { .. }
            | Self::ContentTooLarge { .. } => ErrorCategory::Validation,
            Self::PreconditionHeaderMissing | Self::PreconditionFailed => {
                ErrorCategory::Precondition
            }
            Self::NotFound => ErrorCategory::NotFound,
            Self::Internal(_) => ErrorCategory::Internal,
        }
    }
}

impl From<StoreError> for ProtocolError {
    fn from(err: StoreError) -> Self {
        Self::Internal(format!("Database fatal error: {err}"))
    }
}

impl From<ValidatorFault> for ProtocolError {
    fn from(err: ValidatorFault) -> Self {
        Self::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories() {
        let cases = [
            (ProtocolError::EmptyIdentifier, ErrorCategory::Validation),
            (
                ProtocolError::InvalidAccept {
                    expected: "application/json".into(),
                },
                ErrorCategory::Validation,
            ),
            (
                ProtocolError::InvalidContentType {
                    expected: "application/json".into(),
                },
                ErrorCategory::Validation,
            ),
            (
                ProtocolError::InvalidBody {
                    reason: "x".into(),
                },
                ErrorCategory::Validation,
            ),
            (
                ProtocolError::ContentTooLarge {
                    limit: 1,
                    actual: 2,
                },
                ErrorCategory::Validation,
            ),
            (
                ProtocolError::PreconditionHeaderMissing,
                ErrorCategory::Precondition,
            ),
            (ProtocolError::PreconditionFailed, ErrorCategory::Precondition),
            (ProtocolError::NotFound, ErrorCategory::NotFound),
            (ProtocolError::Internal("x".into()), ErrorCategory::Internal),
        ];
        for (err, category) in cases {
            assert_eq!(err.category(), category, "{err:?}");
        }
    }

    #[test]
    fn store_error_becomes_internal() {
        let err = ProtocolError::from(StoreError::Unavailable("connection refused".into()));
        assert_eq!(err.category(), ErrorCategory::Internal);
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn validator_fault_becomes_internal() {
        let err = ProtocolError::from(ValidatorFault("schema unreadable".into()));
        assert_eq!(err.category(), ErrorCategory::Internal);
        assert!(err.to_string().contains("schema unreadable"));
    }

    #[test]
    fn display_messages() {
        assert_eq!(
            ProtocolError::EmptyIdentifier.to_string(),
            "Resource name cannot be empty"
        );
        assert_eq!(
            ProtocolError::InvalidAccept {
                expected: "application/xml".into()
            }
            .to_string(),
            "Accept header must be \"application/xml\""
        );
        assert_eq!(
            ProtocolError::PreconditionHeaderMissing.to_string(),
            "If-Match header missing"
        );
        assert_eq!(ProtocolError::PreconditionFailed.to_string(), "ETag mismatch");
        assert_eq!(ProtocolError::NotFound.to_string(), "Resource not found");
    }

    #[test]
    fn store_error_display() {
        let err = StoreError::ContentTooLarge {
            limit: 10,
            actual: 11,
        };
        let msg = err.to_string();
        assert!(msg.contains("10"));
        assert!(msg.contains("11"));

        let err = StoreError::Corrupted {
            identifier: "a".into(),
            reason: "bad utf-8".into(),
        };
        assert!(err.to_string().contains("bad utf-8"));
    }

    #[test]
    fn category_strings() {
        assert_eq!(ErrorCategory::Validation.as_str(), "validation");
        assert_eq!(ErrorCategory::Precondition.as_str(), "precondition");
        assert_eq!(ErrorCategory::NotFound.as_str(), "not_found");
        assert_eq!(ErrorCategory::Internal.as_str(), "internal");
    }
}
