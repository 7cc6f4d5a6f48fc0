//! User-visible signals emitted by a notification flow.

use chatlogs_core::types::SessionId;

/// Receives the UI effects of a flow.
///
/// Implementations must be cheap and non-blocking; they are called from
/// async tasks.
pub trait NotificationSink: Send + Sync {
    /// The export for `session_id` can be downloaded.
    fn mark_available(&self, session_id: &SessionId);

    /// Show the completion alert.
    fn success(&self, session_id: &SessionId, message: &str);

    /// Show a non-fatal warning.
    fn warning(&self, session_id: &SessionId, message: &str);
}

/// Renders signals as structured log lines.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl NotificationSink for LogSink {
    fn mark_available(&self, session_id: &SessionId) {
        tracing::info!(session_id = %session_id, "Chat log export available");
    }

    fn success(&self, session_id: &SessionId, message: &str) {
        tracing::info!(session_id = %session_id, message, "Export complete");
    }

    fn warning(&self, session_id: &SessionId, message: &str) {
        tracing::warn!(session_id = %session_id, message, "Export notification warning");
    }
}
