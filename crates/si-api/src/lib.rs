//! # si-api: Axum HTTP Service for the Storage Interface
//!
//! ## API Surface
//!
//! | Path                 | Methods                   | Module                |
//! |----------------------|---------------------------|-----------------------|
//! | `{prefix}{id}`       | GET, HEAD, PUT, DELETE    | [`routes::resources`] |
//! | any                  | POST (501), OPTIONS       | [`routes::resources`] |
//! | `/health/liveness`   | GET                       | [`routes::health`]    |
//! | `/health/readiness`  | GET                       | [`routes::health`]    |
//! | `/metrics`           | GET                       | this module           |
//! | `/openapi.json`      | GET                       | [`openapi`]           |
//!
//! The default prefix is `/StorageInterface/!SI/`.
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → MetricsMiddleware → DefaultBodyLimit → MethodGuard → Router
//! ```

pub mod bootstrap;
pub mod config;
pub mod error;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;

use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::middleware::from_fn;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Router};

use crate::state::AppState;

/// Assemble the full application router with all routes and middleware.
pub fn app(state: AppState) -> Router {
    let mut router = Router::new()
        .merge(routes::health::router())
        .merge(openapi::router());

    if state.metrics.is_some() {
        router = router.route("/metrics", get(prometheus_metrics));
    }

    let mut router = router
        .fallback(routes::resources::dispatch)
        .layer(from_fn(routes::resources::method_guard))
        .layer(DefaultBodyLimit::max(state.config.max_body_bytes));

    // Only register the metrics middleware when metrics are enabled.
    if let Some(metrics) = state.metrics.clone() {
        router = router
            .layer(from_fn(middleware::metrics::metrics_middleware))
            .layer(Extension(metrics));
    }

    router
        .layer(middleware::tracing_layer::layer())
        .with_state(state)
}

/// GET /metrics: Prometheus metrics scrape endpoint.
async fn prometheus_metrics(State(state): State<AppState>) -> impl IntoResponse {
    let Some(metrics) = state.metrics else {
        return StatusCode::NOT_FOUND.into_response();
    };
    match metrics.gather_and_encode() {
        Ok(body) => (
            StatusCode::OK,
            [(
                axum::http::header::CONTENT_TYPE,
                "text/plain; version=0.0.4; charset=utf-8",
            )],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Failed to encode Prometheus metrics: {e}");
            (StatusCode::INTERNAL_SERVER_ERROR, e).into_response()
        }
    }
}
