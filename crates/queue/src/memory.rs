//! In-process FIFO queue with SQS-style deduplication.
//!
//! Used for local development (`QUEUE_BACKEND=memory`) and tests. A message
//! whose dedup id was accepted within the last [`DEFAULT_DEDUP_WINDOW`] is
//! acknowledged but not enqueued again, matching SQS FIFO behaviour.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::publisher::{QueueError, QueueMessage, QueuePublisher};

/// SQS FIFO deduplication interval.
pub const DEFAULT_DEDUP_WINDOW: Duration = Duration::from_secs(5 * 60);

#[derive(Default)]
struct Inner {
    messages: VecDeque<QueueMessage>,
    /// Dedup id -> time it was last accepted.
    accepted_at: HashMap<String, Instant>,
}

pub struct MemoryQueue {
    inner: Mutex<Inner>,
    dedup_window: Duration,
}

impl MemoryQueue {
    pub fn new(dedup_window: Duration) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            dedup_window,
        }
    }

    /// Pop the oldest message, if any.
    pub async fn receive(&self) -> Option<QueueMessage> {
        self.inner.lock().await.messages.pop_front()
    }

    /// Number of messages waiting.
    pub async fn len(&self) -> usize {
        self.inner.lock().await.messages.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for MemoryQueue {
    fn default() -> Self {
        Self::new(DEFAULT_DEDUP_WINDOW)
    }
}

#[async_trait]
impl QueuePublisher for MemoryQueue {
    async fn publish(&self, message: QueueMessage) -> Result<(), QueueError> {
        let now = Instant::now();
        let mut inner = self.inner.lock().await;

        let window = self.dedup_window;
        inner
            .accepted_at
            .retain(|_, accepted| now.duration_since(*accepted) < window);

        if inner.accepted_at.contains_key(&message.dedup_id) {
            tracing::debug!(
                dedup_id = %message.dedup_id,
                "Duplicate message inside dedup window, dropping",
            );
            return Ok(());
        }

        inner.accepted_at.insert(message.dedup_id.clone(), now);
        inner.messages.push_back(message);
        Ok(())
    }
}
