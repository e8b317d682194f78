//! Error types and handling for the prompt relay.
//!
//! This module provides a unified error type [`AppError`] covering every
//! failure that can happen before the plain-text stream starts, and maps each
//! one to a `{"error": "<message>"}` JSON response. Once the stream has
//! started, failures end the body instead (see [`crate::api::streaming`]).

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

pub const MSG_METHOD_NOT_ALLOWED: &str = "Method Not Allowed";
pub const MSG_PROMPT_REQUIRED: &str = "Prompt is required";
pub const MSG_API_KEY_MISSING: &str = "API key not configured";
pub const MSG_UPSTREAM_FAILED: &str = "Failed to fetch from Gemini API";
pub const MSG_INTERNAL: &str = "An internal server error occurred";

/// Main error type for the application.
#[derive(Error, Debug)]
pub enum AppError {
    /// Any method other than POST
    #[error("Method not allowed")]
    MethodNotAllowed,

    /// Body is not JSON or carries no non-empty `prompt` string
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Upstream API key is absent
    #[error("Upstream API key not configured")]
    Misconfigured,

    /// Upstream answered with a non-success status
    #[error("Upstream returned status {status}")]
    Upstream { status: StatusCode },

    /// HTTP request errors from the reqwest client before any response arrived
    #[error("HTTP request error: {0}")]
    Request(#[from] reqwest::Error),

    /// Generic internal server errors with custom message
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Status code sent to the client.
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Misconfigured => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Upstream { status } => *status,
            AppError::Request(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message placed in the `error` field. Internal details never leak here.
    pub fn client_message(&self) -> &'static str {
        match self {
            AppError::MethodNotAllowed => MSG_METHOD_NOT_ALLOWED,
            AppError::InvalidRequest(_) => MSG_PROMPT_REQUIRED,
            AppError::Misconfigured => MSG_API_KEY_MISSING,
            AppError::Upstream { .. } => MSG_UPSTREAM_FAILED,
            AppError::Request(_) | AppError::Internal(_) => MSG_INTERNAL,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            // Logged at error level in `api::upstream`.
            AppError::Request(e) => {
                tracing::debug!(error = %e, "Upstream transport error");
            }
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "Unhandled internal error");
            }
            AppError::InvalidRequest(reason) => {
                tracing::debug!(reason = %reason, "Rejected request");
            }
            _ => {}
        }

        let status = self.status();
        let body = Json(json!({ "error": self.client_message() }));

        (status, body).into_response()
    }
}

/// Convenience type alias for Results using [`AppError`].
pub type Result<T> = std::result::Result<T, AppError>;
