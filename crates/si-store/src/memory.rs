//! In-memory storage backend using DashMap.
//!
//! Each entry is updated under DashMap's per-shard lock, so a reader never
//! observes a half-written value.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use si_core::{Resource, ResourceId, ResourceStore, StoreError};

/// Process-local resource store.
///
/// Cheaply cloneable via `Arc`; all clones share the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    resources: Arc<DashMap<ResourceId, String>>,
    content_limit: Option<usize>,
}

impl MemoryStore {
    /// An unbounded store.
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that refuses content larger than `limit` bytes.
    pub fn with_content_limit(limit: usize) -> Self {
        Self {
            resources: Arc::default(),
            content_limit: Some(limit),
        }
    }

    /// Number of stored resources.
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Whether the store holds no resources.
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

#[async_trait]
impl ResourceStore for MemoryStore {
    async fn get(&self, id: &ResourceId) -> Result<Option<Resource>, StoreError> {
        Ok(self
            .resources
            .get(id)
            .map(|entry| Resource::new(id.clone(), entry.value().clone())))
    }

    async fn put(&self, resource: Resource) -> Result<(), StoreError> {
        if let Some(limit) = self.content_limit {
            let actual = resource.content().len();
            if actual > limit {
                return Err(StoreError::ContentTooLarge { limit, actual });
            }
        }
        let id = resource.id().clone();
        self.resources.insert(id, resource.into_content());
        Ok(())
    }

    async fn delete(&self, id: &ResourceId) -> Result<bool, StoreError> {
        Ok(self.resources.remove(id).is_some())
    }

    fn content_limit(&self) -> Option<usize> {
        self.content_limit
    }
}
