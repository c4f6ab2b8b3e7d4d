//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use orchestrator::OrchestratorError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// No usable caller identity on the request.
    Unauthenticated(String),
    /// Bad request from the client, caught before the orchestrator.
    BadRequest(String),
    /// The caller's identity does not match the requested resource.
    Forbidden(String),
    /// A lifecycle operation failed.
    Orchestrator(OrchestratorError),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Unauthenticated(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::Orchestrator(err) => orchestrator_error_to_response(err),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn orchestrator_error_to_response(err: OrchestratorError) -> (StatusCode, String) {
    let status = match &err {
        OrchestratorError::Validation(_) | OrchestratorError::InsufficientInventory { .. } => {
            StatusCode::BAD_REQUEST
        }
        OrchestratorError::NotFound(_) => StatusCode::NOT_FOUND,
        OrchestratorError::Forbidden { .. } => StatusCode::FORBIDDEN,
        OrchestratorError::InvalidState(_) => StatusCode::CONFLICT,
        OrchestratorError::UpstreamUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        // The order changed but a compensating action is still owed;
        // 502 tells the caller the system is left partially applied.
        OrchestratorError::PartialFailure { .. } => StatusCode::BAD_GATEWAY,
        OrchestratorError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        tracing::error!(error = %err, "storage failure");
    }
    (status, err.to_string())
}

impl From<OrchestratorError> for ApiError {
    fn from(err: OrchestratorError) -> Self {
        ApiError::Orchestrator(err)
    }
}
