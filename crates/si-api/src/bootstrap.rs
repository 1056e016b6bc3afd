//! # Startup Wiring
//!
//! Turns a validated [`AppConfig`] into an [`AppState`]: picks the store
//! backend and the body validator.
//!
//! | Config                          | Store          | Validator              |
//! |---------------------------------|----------------|------------------------|
//! | `database_url` set              | `PgStore`      |                        |
//! | `database_url` unset            | `MemoryStore`  |                        |
//! | no `schema_path`                |                | `AcceptAnyBody`        |
//! | `schema_path`                   |                | `JsonSchemaValidator`  |
//! | `schema_path` + `reload_schema` |                | `SchemaFileValidator`  |

use std::sync::Arc;

use si_core::{BodyValidator, ResourceStore, StoreError};
use si_schema::{AcceptAnyBody, JsonSchemaValidator, SchemaError, SchemaFileValidator};
use si_store::{MemoryStore, PgStore};
use thiserror::Error;

use crate::state::{AppConfig, AppState};

/// Startup failure.
#[derive(Error, Debug)]
pub enum BootstrapError {
    #[error("store initialization failed: {0}")]
    Store(#[from] StoreError),

    #[error("body schema could not be loaded: {0}")]
    Schema(#[from] SchemaError),

    #[error("metrics registry could not be built: {0}")]
    Metrics(#[from] prometheus::Error),
}

/// Build application state from configuration.
pub async fn bootstrap(config: AppConfig) -> Result<AppState, BootstrapError> {
    let store = build_store(&config).await?;
    let validator = build_validator(&config)?;
    Ok(AppState::new(config, store, validator)?)
}

async fn build_store(config: &AppConfig) -> Result<Arc<dyn ResourceStore>, StoreError> {
    match &config.database_url {
        Some(url) => {
            let store = PgStore::connect(url)
                .await?
                .with_content_limit(config.max_body_bytes);
            Ok(Arc::new(store))
        }
        None => {
            tracing::warn!(
                "DATABASE_URL not set, running in-memory only mode. \
                 Resources will not survive restarts."
            );
            Ok(Arc::new(MemoryStore::with_content_limit(
                config.max_body_bytes,
            )))
        }
    }
}

fn build_validator(config: &AppConfig) -> Result<Arc<dyn BodyValidator>, SchemaError> {
    match (&config.schema_path, config.reload_schema) {
        (None, _) => {
            tracing::info!("No body schema configured; PUT bodies are not validated");
            Ok(Arc::new(AcceptAnyBody))
        }
        (Some(path), true) => {
            tracing::info!(schema = %path.display(), "Body schema is re-read on every PUT");
            Ok(Arc::new(SchemaFileValidator::new(path)))
        }
        (Some(path), false) => {
            let validator = JsonSchemaValidator::from_file(path)?;
            tracing::info!(schema = %path.display(), "Body schema compiled");
            Ok(Arc::new(validator))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[tokio::test]
    async fn in_memory_without_schema() {
        let state = bootstrap(AppConfig::default()).await.unwrap();
        assert_eq!(
            state.protocol.store().content_limit(),
            Some(AppConfig::default().max_body_bytes)
        );
    }

    #[tokio::test]
    async fn compiled_schema_must_exist_at_startup() {
        let config = AppConfig {
            schema_path: Some("/nonexistent/si/schema.json".into()),
            ..AppConfig::default()
        };
        let err = bootstrap(config).await.unwrap_err();
        assert!(matches!(err, BootstrapError::Schema(SchemaError::Read { .. })));
    }

    #[tokio::test]
    async fn reloading_schema_is_not_read_at_startup() {
        let config = AppConfig {
            schema_path: Some("/nonexistent/si/schema.json".into()),
            reload_schema: true,
            ..AppConfig::default()
        };
        assert!(bootstrap(config).await.is_ok());
    }

    #[tokio::test]
    async fn compiled_schema_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(br#"{"type": "object"}"#).unwrap();
        let config = AppConfig {
            schema_path: Some(file.path().to_path_buf()),
            ..AppConfig::default()
        };
        assert!(bootstrap(config).await.is_ok());
    }
}
