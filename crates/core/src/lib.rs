//! Shared domain types for chat-log export notifications.
//!
//! Zero internal dependencies so the queue, HTTP service, and notification
//! client crates can all depend on it.

pub mod error;
pub mod types;
