//! `graphql-ws` message types for AppSync realtime subscriptions.
//!
//! Every frame is a JSON object tagged by `"type"`. Outgoing frames are
//! built from [`ClientMessage`]; incoming text frames are parsed into
//! [`ServerMessage`] at the socket boundary.

use chatlogs_core::types::SessionId;
use serde::{Deserialize, Serialize};

/// Subscription document for completion notifications.
pub const ON_NOTIFY_SUBSCRIPTION: &str = "subscription OnNotify($sessionId: String!) {
  onNotify(sessionId: $sessionId) {
    message
    sessionId
  }
}";

/// Frames the client sends.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// First frame after the socket opens.
    ConnectionInit,

    /// Register a subscription under a client-chosen id.
    Start { id: String, payload: StartPayload },

    /// Unregister a subscription.
    Stop { id: String },
}

/// Payload of a `start` frame. `data` is the JSON-encoded GraphQL request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StartPayload {
    pub data: String,
}

#[derive(Serialize)]
struct GraphQlRequest<'a> {
    query: &'a str,
    variables: OnNotifyVariables<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OnNotifyVariables<'a> {
    session_id: &'a str,
}

impl ClientMessage {
    /// Build the `start` frame subscribing to `onNotify` for one session.
    pub fn start_on_notify(subscription_id: &str, session_id: &SessionId) -> Self {
        let request = GraphQlRequest {
            query: ON_NOTIFY_SUBSCRIPTION,
            variables: OnNotifyVariables {
                session_id: session_id.as_str(),
            },
        };
        Self::Start {
            id: subscription_id.to_string(),
            payload: StartPayload {
                data: serde_json::to_string(&request).expect("GraphQlRequest is always serialisable"),
            },
        }
    }

    /// Serialize to the text of a WebSocket frame.
    pub fn to_text(&self) -> String {
        serde_json::to_string(self).expect("ClientMessage is always serialisable")
    }
}

/// Frames the server sends.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    /// The connection was accepted.
    #[serde(rename = "connection_ack")]
    ConnectionAck {
        #[serde(default)]
        payload: serde_json::Value,
    },

    /// Keep-alive.
    #[serde(rename = "ka")]
    KeepAlive,

    /// A subscription was registered.
    #[serde(rename = "start_ack")]
    StartAck {
        #[serde(default)]
        id: Option<String>,
    },

    /// A subscription result.
    #[serde(rename = "data")]
    Data {
        #[serde(default)]
        id: Option<String>,
        payload: DataPayload,
    },

    /// A subscription-level error.
    #[serde(rename = "error")]
    Error {
        #[serde(default)]
        id: Option<String>,
        #[serde(default)]
        payload: serde_json::Value,
    },

    /// The connection was rejected or failed.
    #[serde(rename = "connection_error")]
    ConnectionError {
        #[serde(default)]
        payload: serde_json::Value,
    },

    /// The server ended a subscription.
    #[serde(rename = "complete")]
    Complete {
        #[serde(default)]
        id: Option<String>,
    },

    /// Any other frame type. Logged and ignored.
    #[serde(other)]
    Unknown,
}

/// `payload` of a `data` frame.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DataPayload {
    #[serde(default)]
    pub data: Option<NotifyData>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotifyData {
    #[serde(default, rename = "onNotify")]
    pub on_notify: Option<OnNotifyEvent>,
}

/// The completion event itself. Both fields are optional on the wire; the
/// subscriber only needs the event to be present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnNotifyEvent {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
}

impl ServerMessage {
    /// The `onNotify` event carried by a `data` frame, if any.
    pub fn on_notify(&self) -> Option<&OnNotifyEvent> {
        match self {
            Self::Data { payload, .. } => payload.data.as_ref()?.on_notify.as_ref(),
            _ => None,
        }
    }
}

/// Parse a realtime text frame into a typed message.
///
/// Returns `Err` only for malformed JSON or a known type with a malformed
/// body; unrecognised types parse as [`ServerMessage::Unknown`].
pub fn parse_message(text: &str) -> Result<ServerMessage, serde_json::Error> {
    serde_json::from_str(text)
}
