//! # OpenAPI Specification Assembly
//!
//! Assembles the utoipa-documented resource endpoints into a single OpenAPI
//! document served at `/openapi.json`. Paths are documented under the
//! default prefix and rewritten to the configured prefix when served.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use si_core::PathPrefix;
use utoipa::OpenApi;

use crate::state::AppState;

/// OpenAPI document for the resource endpoints.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Storage Interface",
        description = "Flat namespace of named text resources with optimistic concurrency control.\n\nEvery successful read and write returns an `ETag`: the lowercase hex SHA-256 of identifier followed by content. Updating an existing resource requires `If-Match` equal to its current tag."
    ),
    paths(
        crate::routes::resources::get_resource,
        crate::routes::resources::put_resource,
        crate::routes::resources::delete_resource,
        crate::routes::resources::post_resource,
    ),
    components(schemas(crate::error::ErrorBody, crate::error::ErrorDetail)),
    tags((name = "resources", description = "Resource lifecycle"))
)]
pub struct ApiDoc;

/// Build the document with paths under `prefix`.
pub fn document(prefix: &PathPrefix) -> utoipa::openapi::OpenApi {
    let mut doc = ApiDoc::openapi();
    let default = PathPrefix::default();
    if prefix != &default {
        let paths = std::mem::take(&mut doc.paths.paths);
        doc.paths.paths = paths
            .into_iter()
            .map(|(path, item)| (path.replacen(default.as_str(), prefix.as_str(), 1), item))
            .collect();
    }
    doc
}

pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

async fn openapi_json(State(state): State<AppState>) -> Json<utoipa::openapi::OpenApi> {
    Json(document(state.protocol.prefix()))
}
