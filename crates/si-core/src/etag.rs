//! # Entity Tags
//!
//! The tag of a resource is `hex(SHA-256(utf8(identifier) ‖ utf8(content)))`,
//! rendered as 64 lowercase hex characters.
//!
//! Tags are compared by clients as opaque strings, so the algorithm and the
//! byte layout are fixed for the lifetime of a deployment. They are emitted
//! unquoted and `If-Match` is compared by exact string equality.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::resource::ResourceId;

/// A content-derived resource tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ETag(String);

impl ETag {
    /// Compute the tag for an identifier and its content.
    pub fn compute(id: &ResourceId, content: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(id.as_str().as_bytes());
        hasher.update(content.as_bytes());
        let digest = hasher.finalize();
        Self(digest.iter().map(|b| format!("{b:02x}")).collect())
    }

    /// The tag as it appears in the `ETag` header.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether a client-supplied `If-Match` value names this tag.
    ///
    /// Exact string equality: no weak comparison, no `*`, no list parsing.
    pub fn matches(&self, if_match: &str) -> bool {
        self.0 == if_match
    }
}

impl std::fmt::Display for ETag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> ResourceId {
        ResourceId::parse(s).unwrap()
    }

    #[test]
    fn tag_is_64_lowercase_hex() {
        let tag = ETag::compute(&id("a"), "x");
        assert_eq!(tag.as_str().len(), 64);
        assert!(tag
            .as_str()
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn known_sha256_vector() {
        // SHA-256("abc"), identifier "a" followed by content "bc".
        assert_eq!(
            ETag::compute(&id("a"), "bc").as_str(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn empty_content_hashes_identifier_alone() {
        // SHA-256("abc") again, with all bytes in the identifier.
        assert_eq!(
            ETag::compute(&id("abc"), "").as_str(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn deterministic() {
        assert_eq!(
            ETag::compute(&id("node"), "<a/>"),
            ETag::compute(&id("node"), "<a/>")
        );
    }

    #[test]
    fn near_duplicate_inputs_differ() {
        let base = ETag::compute(&id("node"), "{\"v\":1}");
        let variants = [
            ETag::compute(&id("node"), "{\"v\":2}"),
            ETag::compute(&id("node"), "{\"v\":1} "),
            ETag::compute(&id("node"), "{\"v\":1}\n"),
            ETag::compute(&id("Node"), "{\"v\":1}"),
            ETag::compute(&id("node2"), "{\"v\":1}"),
            ETag::compute(&id("node"), ""),
        ];
        for v in &variants {
            assert_ne!(&base, v);
        }
    }

    #[test]
    fn utf8_content_is_hashed_as_bytes() {
        let a = ETag::compute(&id("n"), "caf\u{e9}");
        let b = ETag::compute(&id("n"), "cafe\u{301}");
        assert_ne!(a, b);
    }

    #[test]
    fn matches_is_exact() {
        let tag = ETag::compute(&id("a"), "x");
        assert!(tag.matches(tag.as_str()));
        assert!(!tag.matches(&format!("\"{tag}\"")));
        assert!(!tag.matches(&tag.as_str().to_uppercase()));
        assert!(!tag.matches("*"));
        assert!(!tag.matches(""));
    }

    #[test]
    fn display_is_bare_hex() {
        let tag = ETag::compute(&id("a"), "x");
        assert_eq!(tag.to_string(), tag.as_str());
    }
}
