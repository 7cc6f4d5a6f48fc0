//! Route definitions for the chat-log export request.

use axum::routing::post;
use axum::Router;

use crate::handlers::csv;
use crate::state::AppState;

/// Routes mounted at the root.
///
/// ```text
/// POST    /csv    -> submit_export
/// OPTIONS /csv    -> preflight
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/csv", post(csv::submit_export).options(csv::preflight))
}
