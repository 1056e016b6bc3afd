//! PostgreSQL storage backend.
//!
//! All operations run against the `si_resources` table. Each statement is a
//! single-row operation, so per-identifier atomicity comes from Postgres
//! itself; there are no multi-statement transactions.

use std::time::Duration;

use async_trait::async_trait;
use si_core::{Resource, ResourceId, ResourceStore, StoreError};
use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::DEFAULT_CONTENT_LIMIT;

/// Resource store backed by a Postgres connection pool.
///
/// Backend ceilings:
///
/// - content longer than the configured limit is refused;
/// - Postgres `TEXT` cannot hold U+0000, so content containing a NUL
///   character is refused by [`ResourceStore::check_content`] and never
///   reaches the database.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
    content_limit: usize,
}

impl PgStore {
    /// Connect, then apply embedded migrations.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(20)
            .min_connections(2)
            .acquire_timeout(Duration::from_secs(5))
            .connect(url)
            .await
            .map_err(unavailable)?;

        tracing::info!("Connected to PostgreSQL");

        let store = Self::from_pool(pool);
        store.migrate().await?;
        Ok(store)
    }

    /// Wrap an existing pool. Migrations are not run.
    pub fn from_pool(pool: PgPool) -> Self {
        Self {
            pool,
            content_limit: DEFAULT_CONTENT_LIMIT,
        }
    }

    /// Override the content ceiling.
    pub fn with_content_limit(mut self, limit: usize) -> Self {
        self.content_limit = limit;
        self
    }

    /// Apply embedded migrations.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Unavailable(format!("migration failed: {e}")))?;
        tracing::info!("Database migrations applied");
        Ok(())
    }

    /// The underlying pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl ResourceStore for PgStore {
    async fn get(&self, id: &ResourceId) -> Result<Option<Resource>, StoreError> {
        let content: Option<String> =
            sqlx::query_scalar("SELECT content FROM si_resources WHERE identifier = $1")
                .bind(id.as_str())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| decode_or_unavailable(id, e))?;

        Ok(content.map(|c| Resource::new(id.clone(), c)))
    }

    async fn put(&self, resource: Resource) -> Result<(), StoreError> {
        let actual = resource.content().len();
        if actual > self.content_limit {
            return Err(StoreError::ContentTooLarge {
                limit: self.content_limit,
                actual,
            });
        }

        sqlx::query(
            "INSERT INTO si_resources (identifier, content) VALUES ($1, $2)
             ON CONFLICT (identifier) DO UPDATE SET content = EXCLUDED.content",
        )
        .bind(resource.id().as_str())
        .bind(resource.content())
        .execute(&self.pool)
        .await
        .map_err(unavailable)?;

        Ok(())
    }

    async fn delete(&self, id: &ResourceId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM si_resources WHERE identifier = $1")
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(unavailable)?;

        Ok(result.rows_affected() > 0)
    }

    fn content_limit(&self) -> Option<usize> {
        Some(self.content_limit)
    }

    fn check_content(&self, content: &str) -> Result<(), String> {
        if content.contains('\0') {
            Err("NUL characters cannot be stored".to_string())
        } else {
            Ok(())
        }
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(unavailable)?;
        Ok(())
    }
}

fn unavailable(err: sqlx::Error) -> StoreError {
    tracing::error!(error = %err, "postgres operation failed");
    StoreError::Unavailable(err.to_string())
}

fn decode_or_unavailable(id: &ResourceId, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
            tracing::error!(identifier = %id, error = %err, "stored resource could not be decoded");
            StoreError::Corrupted {
                identifier: id.to_string(),
                reason: err.to_string(),
            }
        }
        other => unavailable(other),
    }
}
