//! Structured error responses.
//!
//! Every failure leaves the API as `{ "kind", "error", "message" }`, where
//! `kind` is the public classification the client switches on and `error`
//! is the finer-grained snake-case code.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::error;

use tulay_core::workflow::{ErrorKind, WorkflowError};
use tulay_shared::AppError;

/// Errors returned by route handlers.
#[derive(Debug)]
pub enum ApiError {
    /// Workflow rule or persistence failure.
    Workflow(WorkflowError),
    /// Failure outside the workflow engine.
    App(AppError),
}

impl From<WorkflowError> for ApiError {
    fn from(err: WorkflowError) -> Self {
        Self::Workflow(err)
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self::App(err)
    }
}

impl ApiError {
    /// Shorthand for a malformed request body or query.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::App(AppError::Validation(message.into()))
    }

    fn parts(&self) -> (u16, &'static str, String, String) {
        match self {
            Self::Workflow(err) => {
                let kind = err.kind();
                let message = if kind == ErrorKind::Internal {
                    "An error occurred".to_string()
                } else {
                    err.to_string()
                };
                (
                    err.status_code(),
                    kind.as_str(),
                    err.error_code().to_ascii_lowercase(),
                    message,
                )
            }
            Self::App(err) => {
                let message = match err {
                    AppError::Config(_) | AppError::Internal(_) => "An error occurred".to_string(),
                    _ => err.to_string(),
                };
                (
                    err.status_code(),
                    err.kind(),
                    err.error_code().to_ascii_lowercase(),
                    message,
                )
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind, code, message) = self.parts();
        if status >= 500 {
            match &self {
                Self::Workflow(e) => error!(error = %e, "request failed"),
                Self::App(e) => error!(error = %e, "request failed"),
            }
        }

        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (
            status,
            Json(json!({
                "kind": kind,
                "error": code,
                "message": message
            })),
        )
            .into_response()
    }
}
