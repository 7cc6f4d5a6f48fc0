//! Validates export requests and hands them to the work queue.

use std::sync::Arc;

use chatlogs_core::error::CoreError;
use chatlogs_core::types::SessionId;

use crate::publisher::{QueueMessage, QueuePublisher};

/// Confirmation that an export request reached the queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accepted {
    pub session_id: SessionId,
}

/// Publishes one deduplicated queue message per export request.
///
/// Does not retry; a failed publish is reported and the caller decides
/// whether to submit again.
#[derive(Clone)]
pub struct JobSubmitter {
    publisher: Arc<dyn QueuePublisher>,
}

impl JobSubmitter {
    pub fn new(publisher: Arc<dyn QueuePublisher>) -> Self {
        Self { publisher }
    }

    /// Submit an export job for `session_id`.
    ///
    /// An absent or empty id fails with [`CoreError::InvalidInput`] before
    /// the queue is touched. A publish failure is logged and returned as
    /// [`CoreError::Internal`].
    pub async fn submit(&self, session_id: Option<&str>) -> Result<Accepted, CoreError> {
        let session_id = SessionId::parse(session_id.unwrap_or_default())?;

        tracing::info!(session_id = %session_id, "Sending export request to queue");
        self.publisher
            .publish(QueueMessage::for_session(&session_id))
            .await
            .map_err(|e| {
                tracing::error!(session_id = %session_id, error = %e, "Failed to enqueue export request");
                CoreError::Internal(e.to_string())
            })?;
        tracing::info!(session_id = %session_id, "Export request queued");

        Ok(Accepted { session_id })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use assert_matches::assert_matches;
    use async_trait::async_trait;

    use super::*;
    use crate::memory::MemoryQueue;
    use crate::publisher::QueueError;

    /// Publisher that counts calls and always fails.
    #[derive(Default)]
    struct FailingPublisher {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl QueuePublisher for FailingPublisher {
        async fn publish(&self, _message: QueueMessage) -> Result<(), QueueError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(QueueError::Publish("access denied".into()))
        }
    }

    #[tokio::test]
    async fn missing_session_id_never_touches_queue() {
        let queue = Arc::new(MemoryQueue::default());
        let submitter = JobSubmitter::new(queue.clone());

        assert_matches!(submitter.submit(None).await, Err(CoreError::InvalidInput(_)));
        assert_matches!(submitter.submit(Some("")).await, Err(CoreError::InvalidInput(_)));
        assert!(queue.is_empty().await);
    }

    #[tokio::test]
    async fn accepted_submission_enqueues_keyed_message() {
        let queue = Arc::new(MemoryQueue::default());
        let submitter = JobSubmitter::new(queue.clone());

        let accepted = submitter.submit(Some("abc")).await.unwrap();
        assert_eq!(accepted.session_id.as_str(), "abc");

        let msg = queue.receive().await.unwrap();
        assert_eq!(msg.body, r#"{"session_id":"abc"}"#);
        assert_eq!(msg.group_id, "abc");
        assert_eq!(msg.dedup_id, "abc");
    }

    #[tokio::test]
    async fn repeated_submission_is_one_logical_job() {
        let queue = Arc::new(MemoryQueue::default());
        let submitter = JobSubmitter::new(queue.clone());

        submitter.submit(Some("abc")).await.unwrap();
        submitter.submit(Some("abc")).await.unwrap();

        assert_eq!(queue.len().await, 1);
    }

    #[tokio::test]
    async fn publish_failure_is_internal_and_not_retried() {
        let publisher = Arc::new(FailingPublisher::default());
        let submitter = JobSubmitter::new(publisher.clone());

        assert_matches!(
            submitter.submit(Some("abc")).await,
            Err(CoreError::Internal(msg)) if msg.contains("access denied")
        );
        assert_eq!(publisher.calls.load(Ordering::SeqCst), 1);
    }
}
