//! Error types for affinity-me
//!
//! Every failure reaches the client as `{ "error": message }`. Store and
//! internal failures are logged in full and returned with an opaque message.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Store or internal failure (500); detail is logged, not returned
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<affinity_common::Error> for ApiError {
    fn from(err: affinity_common::Error) -> Self {
        match err {
            affinity_common::Error::NotFound(what) => ApiError::NotFound(format!("{} not found", what)),
            affinity_common::Error::InvalidInput(msg) => ApiError::BadRequest(msg),
            other => {
                error!(error = %other, transient = other.is_transient(), "Request failed");
                ApiError::Internal(other.to_string())
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = Json(json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
