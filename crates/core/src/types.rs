//! Session identifiers, job status, and completion notifications.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Message shown to the instructor once a chat-log export is ready.
pub const EXPORT_READY_MESSAGE: &str = "Chat logs are now available!";

/// Opaque, caller-supplied correlation key for one export request.
///
/// Doubles as the queue ordering group and deduplication key, so it is
/// never empty. Construct via [`SessionId::parse`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SessionId(String);

impl SessionId {
    /// Validate a raw session identifier.
    ///
    /// Only the empty string is rejected; any other value (including
    /// whitespace) is passed through untouched because the id is opaque.
    pub fn parse(raw: impl Into<String>) -> Result<Self, CoreError> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(CoreError::InvalidInput("Missing session_id".into()));
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for SessionId {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<SessionId> for String {
    fn from(id: SessionId) -> Self {
        id.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SessionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Completion state of an export job as reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// No job was requested, or its notification was already consumed.
    NotFound,
    /// The job is queued or running.
    Pending,
    /// The batch process finished and a completion record exists.
    Complete,
}

impl JobStatus {
    /// Map the backend's `completionStatus` field to a status.
    ///
    /// `true` is complete, `false` is pending, and anything else (a
    /// missing field, `null`, a non-boolean) means there is nothing to wait
    /// for.
    pub fn from_completion_flag(flag: Option<&serde_json::Value>) -> Self {
        match flag.and_then(serde_json::Value::as_bool) {
            Some(true) => Self::Complete,
            Some(false) => Self::Pending,
            None => Self::NotFound,
        }
    }
}

/// A completion event pushed by the backend for one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub session_id: SessionId,
    pub message: String,
}
