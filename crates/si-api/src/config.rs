//! # Command-Line and Environment Configuration
//!
//! Every flag has an environment fallback so the server can be configured
//! either way in container deployments.

use std::path::PathBuf;

use clap::{ArgAction, Parser, ValueEnum};
use si_core::{MediaType, MediaTypeError, PathPrefix, PrefixError};
use si_store::DEFAULT_CONTENT_LIMIT;
use thiserror::Error;

use crate::state::AppConfig;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines.
    Text,
    /// One JSON object per event.
    Json,
}

/// Storage Interface HTTP server.
#[derive(Parser, Debug)]
#[command(name = "si-api", version, about = "Storage Interface: named text resources over HTTP with ETag concurrency control")]
pub struct ServerArgs {
    /// Port to listen on.
    #[arg(long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    /// Path prefix under which resources are addressed.
    #[arg(long, env = "SI_PREFIX", default_value = "/StorageInterface/!SI/")]
    pub prefix: String,

    /// Media type required in Accept and Content-Type.
    #[arg(long, env = "SI_MEDIA_TYPE", default_value = "application/json")]
    pub media_type: String,

    /// JSON Schema file that PUT bodies must satisfy.
    #[arg(long, env = "SI_SCHEMA_PATH")]
    pub schema: Option<PathBuf>,

    /// Re-read the schema file on every PUT.
    #[arg(long, env = "SI_SCHEMA_RELOAD")]
    pub reload_schema: bool,

    /// PostgreSQL connection URL. Without it resources live in memory.
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: Option<String>,

    /// Maximum request body size in bytes.
    #[arg(long, env = "SI_MAX_BODY_BYTES", default_value_t = DEFAULT_CONTENT_LIMIT)]
    pub max_body_bytes: usize,

    /// Record Prometheus metrics and serve them at /metrics.
    #[arg(long, env = "SI_METRICS_ENABLED", default_value_t = true, action = ArgAction::Set)]
    pub metrics: bool,

    /// Log output format.
    #[arg(long, env = "SI_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

/// Invalid configuration values.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(transparent)]
    Prefix(#[from] PrefixError),

    #[error(transparent)]
    MediaType(#[from] MediaTypeError),

    #[error("--max-body-bytes must be greater than zero")]
    ZeroBodyLimit,

    #[error("--reload-schema requires --schema")]
    ReloadWithoutSchema,

    #[error("--schema validates JSON bodies, but the media type is {0}")]
    SchemaNeedsJson(MediaType),
}

impl ServerArgs {
    /// Validate the parsed arguments into an [`AppConfig`].
    pub fn into_config(self) -> Result<AppConfig, ConfigError> {
        if self.max_body_bytes == 0 {
            return Err(ConfigError::ZeroBodyLimit);
        }
        if self.reload_schema && self.schema.is_none() {
            return Err(ConfigError::ReloadWithoutSchema);
        }
        let media_type = MediaType::new(&self.media_type)?;
        if self.schema.is_some() && !media_type.is_json() {
            return Err(ConfigError::SchemaNeedsJson(media_type));
        }
        Ok(AppConfig {
            port: self.port,
            prefix: PathPrefix::new(&self.prefix)?,
            media_type,
            schema_path: self.schema,
            reload_schema: self.reload_schema,
            database_url: self.database_url,
            max_body_bytes: self.max_body_bytes,
            metrics_enabled: self.metrics,
        })
    }
}
