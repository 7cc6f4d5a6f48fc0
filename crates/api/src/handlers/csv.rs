//! Handlers for the `/csv` export request.
//!
//! The body is read as raw bytes so that malformed JSON, a missing field,
//! and a non-string `session_id` all produce the same `Missing session_id`
//! response instead of axum's extractor rejection.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use crate::error::AppResult;
use crate::state::AppState;

/// Success body for an accepted export request.
#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub message: &'static str,
}

/// Pull a string `session_id` out of a JSON body, if there is one.
fn session_id_from_body(body: &[u8]) -> Option<String> {
    let value: serde_json::Value = serde_json::from_slice(body).ok()?;
    value.get("session_id")?.as_str().map(str::to_owned)
}

/// POST /csv
///
/// Queue a chat-log export for `session_id`. Returns 200 once the message
/// is on the queue, 400 when the id is missing, 500 when publishing fails.
pub async fn submit_export(State(state): State<AppState>, body: Bytes) -> AppResult<impl IntoResponse> {
    let session_id = session_id_from_body(&body);
    let accepted = state.submitter.submit(session_id.as_deref()).await?;

    tracing::info!(session_id = %accepted.session_id, "Export request accepted");

    Ok((
        StatusCode::OK,
        Json(SubmitResponse {
            message: "Job submitted successfully",
        }),
    ))
}

/// OPTIONS /csv
///
/// The CORS headers themselves are attached by the router for every
/// response.
pub async fn preflight() -> StatusCode {
    StatusCode::OK
}
