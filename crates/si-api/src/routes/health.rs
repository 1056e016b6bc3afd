//! Kubernetes-style health probes.

use axum::extract::State;
use axum::routing::get;
use axum::Router;

use crate::error::AppError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness))
}

/// Liveness probe: always returns 200 if the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe: 200 when the resource store answers a ping, else 503.
async fn readiness(State(state): State<AppState>) -> Result<&'static str, AppError> {
    state.protocol.store().ping().await.map_err(|e| {
        tracing::warn!("Store health check failed: {e}");
        AppError::ServiceUnavailable("store unreachable".to_string())
    })?;
    Ok("ready")
}
