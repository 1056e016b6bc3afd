//! # Media Type Rules
//!
//! A deployment serves exactly one media type. The rules are intentionally
//! not content negotiation:
//!
//! - `Accept` must equal the media type exactly (GET and PUT).
//! - `Content-Type` must start with the media type (PUT), which admits
//!   parameters such as `application/json; charset=UTF-8`.

use thiserror::Error;

/// Error building a [`MediaType`] from configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("media type must look like 'type/subtype', got {0:?}")]
pub struct MediaTypeError(pub String);

/// The single media type a deployment accepts and produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaType(String);

impl MediaType {
    /// Validate a configured media type.
    pub fn new(raw: &str) -> Result<Self, MediaTypeError> {
        let raw = raw.trim();
        let well_formed = match raw.split_once('/') {
            Some((ty, sub)) => {
                !ty.is_empty()
                    && !sub.is_empty()
                    && !sub.contains('/')
                    && !raw.contains(|c: char| c.is_whitespace() || c == ';' || c == ',')
            }
            None => false,
        };
        if !well_formed {
            return Err(MediaTypeError(raw.to_string()));
        }
        Ok(Self(raw.to_string()))
    }

    /// The media type string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether bodies of this type are JSON: `application/json` or a
    /// `+json` structured suffix. Case-insensitive.
    pub fn is_json(&self) -> bool {
        let lower = self.0.to_ascii_lowercase();
        lower == "application/json" || lower.ends_with("+json")
    }

    /// Whether an `Accept` header value is acceptable.
    pub fn accepts(&self, accept: Option<&str>) -> bool {
        accept == Some(self.0.as_str())
    }

    /// Whether a `Content-Type` header value is acceptable.
    pub fn admits_content_type(&self, content_type: Option<&str>) -> bool {
        content_type.is_some_and(|ct| ct.starts_with(self.0.as_str()))
    }
}

impl Default for MediaType {
    fn default() -> Self {
        Self("application/json".to_string())
    }
}

impl std::fmt::Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
