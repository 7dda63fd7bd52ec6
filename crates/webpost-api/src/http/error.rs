//! Application error type mapping to HTTP status codes and envelope format.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use webpost_core::service::scenario_run::RunServiceError;
use webpost_types::error::{RunStateError, ScenarioError, SecretError};

use crate::http::response::ApiResponse;

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// Errors from the run service.
    Run(RunServiceError),
    /// Generic internal error.
    Internal(String),
}

impl From<RunServiceError> for AppError {
    fn from(e: RunServiceError) -> Self {
        AppError::Run(e)
    }
}

impl AppError {
    /// Status, machine-readable code and message for this error.
    pub fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::Run(e @ RunServiceError::WaitTooLong(_)) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", e.to_string())
            }
            AppError::Run(e @ RunServiceError::Input(_)) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", e.to_string())
            }
            AppError::Run(e @ RunServiceError::Secret(SecretError::UnknownRef(_))) => {
                (StatusCode::BAD_REQUEST, "UNKNOWN_SECRET_REF", e.to_string())
            }
            AppError::Run(e @ RunServiceError::Secret(_)) => {
                (StatusCode::BAD_REQUEST, "SECRET_ERROR", e.to_string())
            }
            AppError::Run(e @ RunServiceError::Idempotency(_)) => {
                (StatusCode::CONFLICT, "IDEMPOTENCY_CONFLICT", e.to_string())
            }
            AppError::Run(e @ RunServiceError::Scenario(ScenarioError::NotFound(_))) => {
                (StatusCode::NOT_FOUND, "SCENARIO_NOT_FOUND", e.to_string())
            }
            AppError::Run(e @ RunServiceError::Scenario(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "SCENARIO_ERROR", e.to_string())
            }
            AppError::Run(e @ RunServiceError::RunState(RunStateError::NotFound(_))) => {
                (StatusCode::NOT_FOUND, "RUN_NOT_FOUND", e.to_string())
            }
            AppError::Run(e @ RunServiceError::RunState(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "RUN_STATE_ERROR", e.to_string())
            }
            AppError::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg.clone())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();
        if status.is_server_error() {
            tracing::error!(code, %message, "request failed");
        } else {
            tracing::debug!(code, %message, status = status.as_u16(), "request rejected");
        }
        ApiResponse::error(status, code, &message, uuid::Uuid::now_v7().to_string())
            .into_response()
    }
}
