//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Maps [`ProtocolError`] categories and transport outcomes to HTTP status
//! codes with a JSON body of the form `{"error": {"code", "message"}}`.
//! Internal error details are logged, never returned to clients.

use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use si_core::{ErrorCategory, ProtocolError};
use thiserror::Error;
use utoipa::ToSchema;

use crate::routes::resources::ALLOWED_METHODS;

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "NOT_FOUND", "PRECONDITION_FAILED").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

/// Application-level error type that implements [`IntoResponse`] for Axum.
#[derive(Error, Debug)]
pub enum AppError {
    /// Terminal failure of the resource protocol.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// POST on any path (501).
    #[error("POST method is undefined, use PUT instead")]
    NotImplemented,

    /// A verb the resource endpoints do not support (405).
    #[error("method {0} is not allowed")]
    MethodNotAllowed(Method),

    /// Path outside the resource prefix and not a fixed route (404).
    #[error("no route for {0}")]
    NoRoute(String),

    /// Request body exceeds the transport body limit (413).
    #[error("request body too large: {0}")]
    PayloadTooLarge(String),

    /// Request body could not be read (400).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// A dependency needed to serve the request is down (503).
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl AppError {
    /// Return the HTTP status code and machine-readable error code for this error.
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Protocol(err) => match err {
                ProtocolError::EmptyIdentifier => (StatusCode::BAD_REQUEST, "EMPTY_IDENTIFIER"),
                ProtocolError::InvalidAccept { .. } => (StatusCode::BAD_REQUEST, "INVALID_ACCEPT"),
                ProtocolError::InvalidContentType { .. } => {
                    (StatusCode::BAD_REQUEST, "INVALID_CONTENT_TYPE")
                }
                ProtocolError::InvalidBody { .. } => (StatusCode::BAD_REQUEST, "INVALID_BODY"),
                ProtocolError::ContentTooLarge { .. } => {
                    (StatusCode::PAYLOAD_TOO_LARGE, "CONTENT_TOO_LARGE")
                }
                ProtocolError::PreconditionHeaderMissing => {
                    (StatusCode::BAD_REQUEST, "PRECONDITION_HEADER_MISSING")
                }
                ProtocolError::PreconditionFailed => {
                    (StatusCode::PRECONDITION_FAILED, "PRECONDITION_FAILED")
                }
                ProtocolError::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND"),
                ProtocolError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            },
            Self::NotImplemented => (StatusCode::NOT_IMPLEMENTED, "NOT_IMPLEMENTED"),
            Self::MethodNotAllowed(_) => (StatusCode::METHOD_NOT_ALLOWED, "METHOD_NOT_ALLOWED"),
            Self::NoRoute(_) => (StatusCode::NOT_FOUND, "NO_ROUTE"),
            Self::PayloadTooLarge(_) => (StatusCode::PAYLOAD_TOO_LARGE, "PAYLOAD_TOO_LARGE"),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::ServiceUnavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE"),
        }
    }

    fn is_internal(&self) -> bool {
        matches!(self, Self::Protocol(err) if err.category() == ErrorCategory::Internal)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        // Never expose internal error messages to clients.
        let message = if self.is_internal() {
            tracing::error!(error = %self, "internal server error");
            "An internal error occurred".to_string()
        } else {
            tracing::debug!(status = status.as_u16(), code, error = %self, "request rejected");
            self.to_string()
        };

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };

        let mut response = (status, Json(body)).into_response();
        if matches!(self, Self::MethodNotAllowed(_)) {
            response
                .headers_mut()
                .insert(header::ALLOW, HeaderValue::from_static(ALLOWED_METHODS));
        }
        response
    }
}
