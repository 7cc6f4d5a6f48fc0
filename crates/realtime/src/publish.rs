//! Backend-side completion push.
//!
//! The export batch job calls [`CompletionPublisher::publish`] when it
//! finishes. AppSync fans the `sendNotification` mutation out to every
//! `onNotify` subscriber for the same session id.

use chatlogs_core::types::{Notification, SessionId, EXPORT_READY_MESSAGE};
use serde::Deserialize;
use serde_json::json;

/// Mutation that triggers `onNotify`.
pub const SEND_NOTIFICATION_MUTATION: &str = "mutation sendNotification($message: String!, $sessionId: String!) {
  sendNotification(message: $message, sessionId: $sessionId) {
    message
    sessionId
  }
}";

/// Errors from publishing a completion.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// AppSync returned a non-2xx status code.
    #[error("AppSync API error ({status}): {body}")]
    ApiError { status: u16, body: String },

    /// AppSync answered 200 with GraphQL `errors`.
    #[error("GraphQL errors: {0}")]
    GraphQl(String),

    /// The response had neither `errors` nor the expected data.
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),
}

#[derive(Deserialize)]
struct MutationResponse {
    #[serde(default)]
    data: Option<MutationData>,
    #[serde(default)]
    errors: Option<serde_json::Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MutationData {
    send_notification: Option<Notification>,
}

/// Pushes completion events through the AppSync GraphQL endpoint using an
/// API key.
pub struct CompletionPublisher {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
}

impl CompletionPublisher {
    pub fn new(api_url: String, api_key: String) -> Self {
        Self::with_client(reqwest::Client::new(), api_url, api_key)
    }

    /// Reuse an existing [`reqwest::Client`] (connection pooling).
    pub fn with_client(client: reqwest::Client, api_url: String, api_key: String) -> Self {
        Self {
            client,
            api_url,
            api_key,
        }
    }

    /// Announce that the export for `session_id` is ready.
    ///
    /// `message` defaults to [`EXPORT_READY_MESSAGE`].
    pub async fn publish(
        &self,
        session_id: &SessionId,
        message: Option<&str>,
    ) -> Result<Notification, PublishError> {
        let message = message.unwrap_or(EXPORT_READY_MESSAGE);
        let body = json!({
            "query": SEND_NOTIFICATION_MUTATION,
            "variables": {
                "message": message,
                "sessionId": session_id.as_str(),
            },
        });

        let response = self
            .client
            .post(&self.api_url)
            .header("x-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(PublishError::ApiError {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: MutationResponse = response.json().await?;
        if let Some(errors) = parsed.errors {
            return Err(PublishError::GraphQl(errors.to_string()));
        }

        let notification = parsed
            .data
            .and_then(|d| d.send_notification)
            .ok_or_else(|| PublishError::UnexpectedResponse("missing data.sendNotification".into()))?;

        tracing::info!(session_id = %session_id, "Completion notification published");
        Ok(notification)
    }
}
