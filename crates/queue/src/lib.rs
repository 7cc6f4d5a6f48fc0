//! Export job submission onto a FIFO work queue.
//!
//! [`JobSubmitter`](submitter::JobSubmitter) validates a session id and
//! publishes one message per request through a
//! [`QueuePublisher`](publisher::QueuePublisher). The session id is both the
//! ordering group and the deduplication key, so repeated submissions inside
//! the queue's dedup window collapse into one job.

pub mod memory;
pub mod publisher;
pub mod sqs;
pub mod submitter;
