//! # Resources and Identifiers
//!
//! A resource is an `(identifier, content)` pair. The identifier is assigned
//! by the client on creation and never changes; writing under a different
//! identifier creates a different resource.
//!
//! Identifiers are taken verbatim from the request path after the configured
//! [`PathPrefix`] has been stripped. They are opaque: no percent-decoding, no
//! segment splitting, so `a/b` is a single identifier in the flat namespace.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::ProtocolError;
use crate::etag::ETag;

/// A non-empty resource identifier.
///
/// The only validated constructor is [`ResourceId::parse`], which rejects the
/// empty string with [`ProtocolError::EmptyIdentifier`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ResourceId(String);

impl ResourceId {
    /// Validate a raw identifier.
    pub fn parse(raw: impl Into<String>) -> Result<Self, ProtocolError> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(ProtocolError::EmptyIdentifier);
        }
        Ok(Self(raw))
    }

    /// Borrow the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ResourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ResourceId {
    type Error = ProtocolError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<ResourceId> for String {
    fn from(id: ResourceId) -> Self {
        id.0
    }
}

/// A stored resource: identifier plus string content.
///
/// The ETag is deliberately not a field. It is derived on demand through
/// [`Resource::etag`] so that content written by any other path can never
/// leave a stale tag behind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    id: ResourceId,
    content: String,
}

impl Resource {
    /// Build a resource record.
    pub fn new(id: ResourceId, content: impl Into<String>) -> Self {
        Self {
            id,
            content: content.into(),
        }
    }

    /// The resource identifier.
    pub fn id(&self) -> &ResourceId {
        &self.id
    }

    /// The resource content.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Consume the record, returning its content.
    pub fn into_content(self) -> String {
        self.content
    }

    /// Compute the current tag of this resource.
    pub fn etag(&self) -> ETag {
        ETag::compute(&self.id, &self.content)
    }
}

/// Error building a [`PathPrefix`] from configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PrefixError {
    /// The configured prefix was empty or only slashes.
    #[error("resource path prefix must contain at least one segment, got {0:?}")]
    Empty(String),

    /// The prefix contains characters that cannot appear in a request path.
    #[error("resource path prefix contains whitespace or '?': {0:?}")]
    InvalidCharacter(String),
}

/// The fixed request-path prefix under which resources are addressed.
///
/// Normalized on construction to start and end with `/`, so
/// `StorageInterface/!SI` and `/StorageInterface/!SI/` are the same prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPrefix(String);

impl PathPrefix {
    /// Normalize and validate a configured prefix.
    pub fn new(raw: &str) -> Result<Self, PrefixError> {
        let trimmed = raw.trim_matches('/');
        if trimmed.is_empty() {
            return Err(PrefixError::Empty(raw.to_string()));
        }
        if trimmed.chars().any(|c| c.is_whitespace() || c == '?') {
            return Err(PrefixError::InvalidCharacter(raw.to_string()));
        }
        Ok(Self(format!("/{trimmed}/")))
    }

    /// The normalized prefix, with leading and trailing `/`.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Strip the prefix from a request path.
    ///
    /// Returns `None` when the path is outside the prefix. The bare prefix
    /// (with or without its trailing slash) yields `Some("")`, which the
    /// protocol then rejects as an empty identifier.
    pub fn strip<'a>(&self, path: &'a str) -> Option<&'a str> {
        if let Some(rest) = path.strip_prefix(self.0.as_str()) {
            return Some(rest);
        }
        if path == &self.0[..self.0.len() - 1] {
            return Some("");
        }
        None
    }
}

impl Default for PathPrefix {
    fn default() -> Self {
        Self("/StorageInterface/!SI/".to_string())
    }
}

impl std::fmt::Display for PathPrefix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
