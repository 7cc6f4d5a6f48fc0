//! Queue message shape and the publisher seam.

use async_trait::async_trait;
use chatlogs_core::types::SessionId;
use serde::Serialize;

/// A single message bound for the export work queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueMessage {
    /// JSON body, `{"session_id": "..."}`.
    pub body: String,
    /// FIFO ordering group.
    pub group_id: String,
    /// FIFO deduplication key.
    pub dedup_id: String,
}

#[derive(Serialize)]
struct MessageBody<'a> {
    session_id: &'a str,
}

impl QueueMessage {
    /// Build the message for one export request.
    ///
    /// The session id is used verbatim for the body, the group id, and the
    /// dedup id.
    pub fn for_session(session_id: &SessionId) -> Self {
        let body = serde_json::to_string(&MessageBody {
            session_id: session_id.as_str(),
        })
        .expect("MessageBody is always serialisable");

        Self {
            body,
            group_id: session_id.to_string(),
            dedup_id: session_id.to_string(),
        }
    }
}

/// Errors from publishing to a queue backend.
#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    /// The backend rejected or failed the send call.
    #[error("Failed to publish message: {0}")]
    Publish(String),

    /// The publisher is misconfigured (missing queue URL, etc.).
    #[error("Queue configuration error: {0}")]
    Config(String),
}

/// Anything that can accept a FIFO message.
#[async_trait]
pub trait QueuePublisher: Send + Sync {
    /// Send one message. Deduplication is the backend's responsibility.
    async fn publish(&self, message: QueueMessage) -> Result<(), QueueError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_uses_session_id_for_body_group_and_dedup() {
        let id = SessionId::parse("abc").unwrap();
        let msg = QueueMessage::for_session(&id);

        assert_eq!(msg.body, r#"{"session_id":"abc"}"#);
        assert_eq!(msg.group_id, "abc");
        assert_eq!(msg.dedup_id, "abc");
    }

    #[test]
    fn message_body_escapes_json() {
        let id = SessionId::parse(r#"a"b"#).unwrap();
        let msg = QueueMessage::for_session(&id);
        let parsed: serde_json::Value = serde_json::from_str(&msg.body).unwrap();
        assert_eq!(parsed["session_id"], r#"a"b"#);
    }
}
