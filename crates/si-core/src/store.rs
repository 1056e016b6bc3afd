//! # Resource Store Seam
//!
//! The protocol consumes persistence through [`ResourceStore`]. Any backend
//! with per-identifier atomic get / put / delete is substitutable; there are
//! no cross-key transactions.

use async_trait::async_trait;

use crate::error::StoreError;
use crate::resource::{Resource, ResourceId};

/// Key/value persistence for resources, keyed by identifier.
///
/// Implementations must be `Send + Sync` and safe to share across requests.
/// A concurrent reader must never observe a partially written record.
#[async_trait]
pub trait ResourceStore: Send + Sync + 'static {
    /// Fetch a resource. Absence is `Ok(None)`, never an error.
    async fn get(&self, id: &ResourceId) -> Result<Option<Resource>, StoreError>;

    /// Create or overwrite a resource.
    async fn put(&self, resource: Resource) -> Result<(), StoreError>;

    /// Remove a resource, reporting whether one was actually removed.
    async fn delete(&self, id: &ResourceId) -> Result<bool, StoreError>;

    /// Largest content, in bytes, this backend stores without truncation.
    ///
    /// `None` means no ceiling beyond the transport body limit.
    fn content_limit(&self) -> Option<usize> {
        None
    }

    /// Backend-specific restrictions on content, checked before any write.
    ///
    /// `Err` carries the reason the content cannot be stored; the protocol
    /// reports it as an invalid body.
    fn check_content(&self, _content: &str) -> Result<(), String> {
        Ok(())
    }

    /// Check that the backend is reachable. Used by the readiness probe.
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
