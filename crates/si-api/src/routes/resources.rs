//! # Resource Endpoints
//!
//! `GET`, `HEAD`, `PUT`, and `DELETE` on `{prefix}{id}`, where `{id}` is
//! everything after the prefix, taken verbatim. An identifier may contain
//! `/`, which an Axum path wildcard cannot match as empty, so resource
//! requests are dispatched from the router fallback instead of a route.
//!
//! `POST` on any path is answered with 501 and `OPTIONS` with the list of
//! supported methods, both by [`method_guard`] before routing.

use axum::body::{Body, Bytes};
use axum::extract::rejection::BytesRejection;
use axum::extract::{Request, State};
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use si_core::{ProtocolError, RequestHeaders, ResourceView, WriteKind};

use crate::error::AppError;
use crate::middleware::metrics::PreconditionReason;
use crate::state::AppState;

/// Methods supported on resource paths.
pub const ALLOWED_METHODS: &str = "GET, HEAD, PUT, DELETE, OPTIONS";

/// Answer `POST` and `OPTIONS` before routing.
pub async fn method_guard(request: Request, next: Next) -> Response {
    match *request.method() {
        Method::POST => AppError::NotImplemented.into_response(),
        Method::OPTIONS => (
            StatusCode::OK,
            [(header::ALLOW, HeaderValue::from_static(ALLOWED_METHODS))],
        )
            .into_response(),
        _ => next.run(request).await,
    }
}

/// Router fallback: resolve the identifier and dispatch on method.
pub async fn dispatch(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<Response, AppError> {
    let Some(raw_id) = state.protocol.identifier_from_path(uri.path()) else {
        return Err(AppError::NoRoute(uri.path().to_string()));
    };

    match method {
        Method::GET => get_resource(&state, raw_id, &headers).await,
        Method::HEAD => {
            let mut response = get_resource(&state, raw_id, &headers).await?;
            *response.body_mut() = Body::empty();
            Ok(response)
        }
        Method::PUT => {
            // A bad identifier or header outranks an oversized body.
            state
                .protocol
                .check_write_syntax(raw_id, &request_headers(&headers))?;
            let body = body.map_err(body_rejection)?;
            put_resource(&state, raw_id, &headers, &body).await
        }
        Method::DELETE => delete_resource(&state, raw_id).await,
        other => Err(AppError::MethodNotAllowed(other)),
    }
}

/// Read a resource.
#[utoipa::path(
    get,
    path = "/StorageInterface/!SI/{id}",
    params(
        ("id" = String, Path, description = "Resource identifier (everything after the prefix)"),
        ("Accept" = String, Header, description = "Must equal the configured media type"),
    ),
    responses(
        (status = 200, description = "Resource content", body = String,
            headers(("ETag" = String, description = "SHA-256 of identifier and content, lowercase hex"))),
        (status = 400, description = "Empty identifier or bad Accept", body = crate::error::ErrorBody),
        (status = 404, description = "Resource not found", body = crate::error::ErrorBody),
    ),
    tag = "resources"
)]
pub(crate) async fn get_resource(
    state: &AppState,
    raw_id: &str,
    headers: &HeaderMap,
) -> Result<Response, AppError> {
    let view = state
        .protocol
        .read(raw_id, &request_headers(headers))
        .await?;
    resource_response(state, StatusCode::OK, view)
}

/// Create or update a resource.
#[utoipa::path(
    put,
    path = "/StorageInterface/!SI/{id}",
    params(
        ("id" = String, Path, description = "Resource identifier (everything after the prefix)"),
        ("Accept" = String, Header, description = "Must equal the configured media type"),
        ("Content-Type" = String, Header, description = "Must start with the configured media type"),
        ("If-Match" = Option<String>, Header, description = "Current ETag; required when the resource exists"),
    ),
    request_body(content = String, description = "New content, checked against the body schema"),
    responses(
        (status = 201, description = "Resource created", body = String,
            headers(("ETag" = String, description = "Tag of the persisted resource"))),
        (status = 200, description = "Resource updated", body = String,
            headers(("ETag" = String, description = "Tag of the persisted resource"))),
        (status = 400, description = "Empty identifier, bad headers, missing If-Match, or invalid body", body = crate::error::ErrorBody),
        (status = 412, description = "If-Match does not equal the current ETag", body = crate::error::ErrorBody),
        (status = 413, description = "Body exceeds the size limit", body = crate::error::ErrorBody),
        (status = 500, description = "Store or validator failure", body = crate::error::ErrorBody),
    ),
    tag = "resources"
)]
pub(crate) async fn put_resource(
    state: &AppState,
    raw_id: &str,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<Response, AppError> {
    let result = state
        .protocol
        .write(raw_id, &request_headers(headers), body)
        .await;

    if let Some(metrics) = &state.metrics {
        match &result {
            Ok(outcome) => metrics.record_write(outcome.kind),
            Err(ProtocolError::PreconditionHeaderMissing) => {
                metrics.record_precondition_failure(PreconditionReason::Missing)
            }
            Err(ProtocolError::PreconditionFailed) => {
                metrics.record_precondition_failure(PreconditionReason::Mismatch)
            }
            Err(_) => {}
        }
    }

    let outcome = result?;
    let status = match outcome.kind {
        WriteKind::Created => StatusCode::CREATED,
        WriteKind::Updated => StatusCode::OK,
    };
    resource_response(state, status, outcome.resource)
}

/// Delete a resource.
#[utoipa::path(
    delete,
    path = "/StorageInterface/!SI/{id}",
    params(("id" = String, Path, description = "Resource identifier (everything after the prefix)")),
    responses(
        (status = 200, description = "Resource deleted"),
        (status = 400, description = "Empty identifier", body = crate::error::ErrorBody),
        (status = 404, description = "Resource not found", body = crate::error::ErrorBody),
        (status = 500, description = "Store failure", body = crate::error::ErrorBody),
    ),
    tag = "resources"
)]
pub(crate) async fn delete_resource(state: &AppState, raw_id: &str) -> Result<Response, AppError> {
    state.protocol.delete(raw_id).await?;
    if let Some(metrics) = &state.metrics {
        metrics.record_delete();
    }
    Ok(StatusCode::OK.into_response())
}

/// POST is not part of the resource protocol.
#[utoipa::path(
    post,
    path = "/StorageInterface/!SI/{id}",
    params(("id" = String, Path, description = "Any path")),
    responses(
        (status = 501, description = "POST is undefined, use PUT instead", body = crate::error::ErrorBody),
    ),
    tag = "resources"
)]
#[allow(dead_code)]
fn post_resource() {}

fn request_headers(headers: &HeaderMap) -> RequestHeaders {
    RequestHeaders {
        accept: header_string(headers, &header::ACCEPT),
        content_type: header_string(headers, &header::CONTENT_TYPE),
        if_match: header_string(headers, &header::IF_MATCH),
    }
}

fn header_string(headers: &HeaderMap, name: &HeaderName) -> Option<String> {
    headers
        .get(name)
        .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
}

fn resource_response(
    state: &AppState,
    status: StatusCode,
    view: ResourceView,
) -> Result<Response, AppError> {
    let etag = header_value(view.etag.as_str())?;
    let content_type = header_value(state.protocol.media_type().as_str())?;
    Ok((
        status,
        [(header::ETAG, etag), (header::CONTENT_TYPE, content_type)],
        view.content,
    )
        .into_response())
}

fn header_value(value: &str) -> Result<HeaderValue, AppError> {
    HeaderValue::from_str(value).map_err(|e| {
        AppError::Protocol(ProtocolError::Internal(format!(
            "response header value {value:?} is invalid: {e}"
        )))
    })
}

fn body_rejection(rejection: BytesRejection) -> AppError {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(rejection.body_text())
    } else {
        AppError::BadRequest(rejection.body_text())
    }
}
