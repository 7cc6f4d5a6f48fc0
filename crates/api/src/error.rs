use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chatlogs_core::error::CoreError;
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors. Implements [`IntoResponse`] to
/// produce the `{ "error": ... }` bodies the admin console expects.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `chatlogs_core`.
    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

/// Sanitized body for every 5xx response.
const INTERNAL_MESSAGE: &str = "Internal Server Error";

/// Response for a handler that panicked, in the same shape as other 5xx
/// errors.
pub fn panic_response(panic: Box<dyn std::any::Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!(panic = %detail, "Handler panicked");

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        axum::Json(json!({ "error": INTERNAL_MESSAGE })),
    )
        .into_response()
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Core(core) => match core {
                CoreError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
                CoreError::Auth(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
                CoreError::Timeout(_) => {
                    tracing::warn!(error = %core, "Upstream timeout");
                    (StatusCode::GATEWAY_TIMEOUT, "Gateway Timeout".to_string())
                }
                CoreError::Transport(msg) | CoreError::Internal(msg) => {
                    tracing::error!(error = %msg, "Error processing export request");
                    (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MESSAGE.to_string())
                }
            },
        };

        (status, axum::Json(json!({ "error": message }))).into_response()
    }
}
