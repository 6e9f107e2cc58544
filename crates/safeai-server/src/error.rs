//! HTTP error shape: `{"error": "<message>"}`, with the status code chosen
//! by error kind (SPEC_FULL.md §6 "error-shape/status-code mapping").

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use safeai_core::SafeAiError;

/// Every failure a handler can return, mapped to one HTTP status.
#[derive(Debug)]
pub enum ApiError {
    /// Malformed request body or a value that failed validation. 400.
    BadRequest(String),
    /// A policy/contract/identity/capability gate blocked the request. 403.
    Forbidden(String),
    /// An unknown tool, agent, schema, or approval id was referenced. 404.
    NotFound(String),
    /// An approval request was already decided. 409.
    Conflict(String),
    /// An underlying I/O or configuration failure. 500.
    Internal(String),
}

/// Builds the standard `{"error": message}` response at `status`.
pub fn json_error(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::BadRequest(msg) => json_error(StatusCode::BAD_REQUEST, msg),
            Self::Forbidden(msg) => json_error(StatusCode::FORBIDDEN, msg),
            Self::NotFound(msg) => json_error(StatusCode::NOT_FOUND, msg),
            Self::Conflict(msg) => json_error(StatusCode::CONFLICT, msg),
            Self::Internal(msg) => json_error(StatusCode::INTERNAL_SERVER_ERROR, msg),
        }
    }
}

impl From<SafeAiError> for ApiError {
    fn from(err: SafeAiError) -> Self {
        match err {
            SafeAiError::Validation(msg) | SafeAiError::InvalidDuration(msg) => Self::BadRequest(msg),
            SafeAiError::Config(msg) => Self::Internal(msg),
            SafeAiError::Io(err) => Self::Internal(err.to_string()),
            SafeAiError::Json(err) => Self::BadRequest(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<safeai_secrets::SecretError> for ApiError {
    fn from(err: safeai_secrets::SecretError) -> Self {
        match err {
            safeai_secrets::SecretError::SecretAccessDenied(msg) => Self::Forbidden(msg),
            safeai_secrets::SecretError::SecretNotFound(msg) => Self::NotFound(msg),
            safeai_secrets::SecretError::BackendNotFound(msg) => Self::NotFound(msg),
        }
    }
}
