//! API error types
//!
//! Converts store failures into structured JSON error responses. Nothing
//! crosses the handler boundary as a panic; every failure becomes a body of
//! the shape `{error, message}` (plus `detail` outside production mode).

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

use fleetsnap_core::StoreError;

/// API errors
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid request payload
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Identity required but not supplied
    #[error("authentication required")]
    Unauthorized,

    /// Resource not found
    #[error("not found: {0}")]
    NotFound(String),

    /// Persistence or schema failure
    #[error("internal error: {message}")]
    Internal {
        message: String,
        /// Underlying error text, attached only when the server is
        /// configured to expose it
        detail: Option<String>,
    },
}

impl ApiError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Internal { .. } => "INTERNAL_ERROR",
        }
    }

    /// Map a store failure onto the API taxonomy
    ///
    /// Validation is the client's fault (400), a read miss is 404, and every
    /// persistence-side failure is a 500 whose driver detail is only exposed
    /// when `expose_detail` is set.
    pub fn from_store(err: StoreError, expose_detail: bool) -> Self {
        match err {
            StoreError::Validation(msg) => Self::BadRequest(msg),
            StoreError::NotFound { user_id } => {
                Self::NotFound(format!("no inventory record for user {}", user_id))
            }
            StoreError::Schema(_) => Self::internal("schema creation failed", &err, expose_detail),
            StoreError::Persistence(_) => {
                Self::internal("failed to persist inventory", &err, expose_detail)
            }
            StoreError::Timeout(_) => {
                Self::internal("persistence operation timed out", &err, expose_detail)
            }
        }
    }

    fn internal(message: &str, err: &StoreError, expose_detail: bool) -> Self {
        Self::Internal {
            message: message.to_string(),
            detail: expose_detail.then(|| err.to_string()),
        }
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code (machine-readable)
    pub error: &'static str,
    /// Error message (human-readable)
    pub message: String,
    /// Debug detail (non-production mode only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let detail = match &self {
            Self::Internal { detail, .. } => detail.clone(),
            _ => None,
        };
        let body = ErrorResponse {
            error: self.code(),
            message: self.to_string(),
            detail,
        };

        tracing::warn!(
            error_code = body.error,
            error_message = %body.message,
            status = %status,
            "API error"
        );

        (status, Json(body)).into_response()
    }
}

/// Result type for API operations
pub type Result<T> = std::result::Result<T, ApiError>;
