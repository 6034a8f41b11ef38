//! Maps [`engram_core::error::EngineError`] onto HTTP responses.
//!
//! Every failure path renders the same envelope — `{"error": {"status",
//! "message", "details"}}` — so clients never need to branch on route.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use engram_core::error::EngineError;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Serialize)]
struct ErrorDetail {
    status: u16,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

/// Thin wrapper so handlers can `?`-propagate `EngineError` and a handful
/// of request-validation failures that never reach the engine.
pub struct ApiError {
    status: StatusCode,
    message: String,
    details: Option<String>,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self { status: StatusCode::BAD_REQUEST, message: message.into(), details: None }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self { status: StatusCode::NOT_FOUND, message: message.into(), details: None }
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Validation(msg) => Self { status: StatusCode::BAD_REQUEST, message: msg, details: None },
            EngineError::NotFound(id) => Self { status: StatusCode::NOT_FOUND, message: format!("not found: {id}"), details: None },
            EngineError::Provider(e) => {
                Self { status: StatusCode::BAD_GATEWAY, message: "upstream provider failed".to_string(), details: Some(e.to_string()) }
            }
            EngineError::Store(e) => {
                Self { status: StatusCode::INTERNAL_SERVER_ERROR, message: "storage error".to_string(), details: Some(e.to_string()) }
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status;
        let body = ErrorBody { error: ErrorDetail { status: status.as_u16(), message: self.message, details: self.details } };
        (status, Json(body)).into_response()
    }
}
