//! Amazon SQS FIFO publisher.

use async_trait::async_trait;
use aws_sdk_sqs::error::DisplayErrorContext;

use crate::publisher::{QueueError, QueueMessage, QueuePublisher};

/// Publishes export requests to an SQS FIFO queue.
pub struct SqsPublisher {
    client: aws_sdk_sqs::Client,
    queue_url: String,
}

impl SqsPublisher {
    /// Wrap an existing SQS client.
    pub fn new(client: aws_sdk_sqs::Client, queue_url: String) -> Self {
        Self { client, queue_url }
    }

    /// Build a publisher from the ambient AWS configuration (region and
    /// credentials from the environment / default provider chain).
    pub async fn from_env(queue_url: String) -> Result<Self, QueueError> {
        if queue_url.is_empty() {
            return Err(QueueError::Config("queue URL is empty".into()));
        }
        let config = aws_config::load_from_env().await;
        Ok(Self::new(aws_sdk_sqs::Client::new(&config), queue_url))
    }

    /// Target queue URL.
    pub fn queue_url(&self) -> &str {
        &self.queue_url
    }
}

#[async_trait]
impl QueuePublisher for SqsPublisher {
    async fn publish(&self, message: QueueMessage) -> Result<(), QueueError> {
        let output = self
            .client
            .send_message()
            .queue_url(&self.queue_url)
            .message_body(message.body)
            .message_group_id(message.group_id)
            .message_deduplication_id(message.dedup_id)
            .send()
            .await
            .map_err(|e| QueueError::Publish(DisplayErrorContext(&e).to_string()))?;

        tracing::debug!(
            message_id = output.message_id().unwrap_or_default(),
            sequence_number = output.sequence_number().unwrap_or_default(),
            "SQS accepted message",
        );
        Ok(())
    }
}
