//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use common::RemoteError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Missing or malformed bearer token.
    Unauthorized,
    /// Error from a cart or order service.
    Service(RemoteError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "missing bearer token".to_string(),
            ),
            ApiError::Service(err) => service_error_to_response(err),
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn service_error_to_response(err: RemoteError) -> (StatusCode, String) {
    match err {
        RemoteError::AuthRequired => (StatusCode::UNAUTHORIZED, err.to_string()),
        RemoteError::Rejected { status, message } => (
            StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_REQUEST),
            message,
        ),
        RemoteError::Transient(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
        RemoteError::Decode(msg) => {
            tracing::error!(error = %msg, "internal server error");
            (StatusCode::INTERNAL_SERVER_ERROR, msg)
        }
    }
}

impl From<RemoteError> for ApiError {
    fn from(err: RemoteError) -> Self {
        ApiError::Service(err)
    }
}
