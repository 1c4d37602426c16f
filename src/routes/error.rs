use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::{authz::RegistryError, db::DbError};

/// JSON error envelope: `{"error": {"type": "...", "message": "...", "code": "..."}}`
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorInfo,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Error class (e.g. "authentication_error", "permission_error")
    #[serde(rename = "type")]
    pub error_type: String,
    pub message: String,
    /// Machine-readable error code
    pub code: String,
}

impl ErrorResponse {
    pub fn new(
        error_type: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorInfo {
                error_type: error_type.into(),
                message: message.into(),
                code: code.into(),
            },
        }
    }
}

/// Errors returned by the admin endpoints.
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    Conflict(String),
    Validation(String),
    Unavailable(String),
    Internal,
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound => ApiError::NotFound("Resource not found".to_string()),
            DbError::Conflict(msg) => ApiError::Conflict(msg),
            DbError::Validation(msg) => ApiError::Validation(msg),
            err => {
                tracing::error!(error = %err, "Store error");
                ApiError::Internal
            }
        }
    }
}

impl From<RegistryError> for ApiError {
    fn from(err: RegistryError) -> Self {
        tracing::error!(error = %err, "Resource rule load failed");
        ApiError::Unavailable(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, code, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "invalid_request_error", "not_found", msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "invalid_request_error", "conflict", msg),
            ApiError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                "invalid_request_error",
                "validation_error",
                msg,
            ),
            ApiError::Unavailable(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "server_error",
                "rules_unavailable",
                msg,
            ),
            ApiError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "server_error",
                "internal_error",
                "An internal error occurred".to_string(),
            ),
        };

        (status, Json(ErrorResponse::new(error_type, code, message))).into_response()
    }
}
