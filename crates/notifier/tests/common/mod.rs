//! Shared test helpers for notifier integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chatlogs_core::types::SessionId;
use chatlogs_notifier::api::StatusApi;
use chatlogs_notifier::orchestrator::Orchestrator;
use chatlogs_notifier::sink::NotificationSink;
use chatlogs_realtime::memory::{MemoryConnector, ServerEnd};
use chatlogs_realtime::subscriber::CompletionSubscriber;
use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio_tungstenite::tungstenite::Message;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const ID_TOKEN: &str = "test-id-token";
pub const STATUS_PATH: &str = "/prod/admin/csv";

// ---------------------------------------------------------------------------
// Recording sink
// ---------------------------------------------------------------------------

/// One UI effect, in the order it was emitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signal {
    Available(String),
    Success(String),
    Warning(String),
}

#[derive(Default)]
pub struct RecordingSink {
    signals: Mutex<Vec<Signal>>,
}

impl RecordingSink {
    pub fn signals(&self) -> Vec<Signal> {
        self.signals.lock().unwrap().clone()
    }

    fn push(&self, signal: Signal) {
        self.signals.lock().unwrap().push(signal);
    }
}

impl NotificationSink for RecordingSink {
    fn mark_available(&self, session_id: &SessionId) {
        self.push(Signal::Available(session_id.to_string()));
    }

    fn success(&self, _session_id: &SessionId, message: &str) {
        self.push(Signal::Success(message.to_string()));
    }

    fn warning(&self, _session_id: &SessionId, message: &str) {
        self.push(Signal::Warning(message.to_string()));
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

/// Orchestrator wired to a mock REST backend and in-memory sockets.
pub struct Harness {
    pub backend: MockServer,
    pub connector: Arc<MemoryConnector>,
    pub servers: UnboundedReceiver<ServerEnd>,
    pub sink: Arc<RecordingSink>,
    pub orchestrator: Arc<Orchestrator<MemoryConnector>>,
}

impl Harness {
    pub async fn start() -> Self {
        Self::with_timeout(Duration::from_secs(180)).await
    }

    pub async fn with_timeout(timeout: Duration) -> Self {
        let backend = MockServer::start().await;
        let (connector, servers) = MemoryConnector::new();
        let connector = Arc::new(connector);
        let sink = Arc::new(RecordingSink::default());

        let orchestrator = Orchestrator::new(
            StatusApi::new(&format!("{}/prod/", backend.uri())),
            CompletionSubscriber::with_timeout(Arc::clone(&connector), timeout),
            sink.clone(),
        );

        Self {
            backend,
            connector,
            servers,
            sink,
            orchestrator: Arc::new(orchestrator),
        }
    }

    /// Run a flow on a background task.
    pub fn spawn_run(
        &self,
        session_id: &str,
    ) -> tokio::task::JoinHandle<chatlogs_notifier::orchestrator::FlowOutcome> {
        let orchestrator = Arc::clone(&self.orchestrator);
        let session_id = session(session_id);
        tokio::spawn(async move { orchestrator.run(session_id, ID_TOKEN).await })
    }

    /// Answer the status check with `body`.
    pub async fn mount_status(&self, body: Value) {
        self.mount_status_after(body, Duration::ZERO).await;
    }

    /// Answer the status check with `body` after `delay`.
    pub async fn mount_status_after(&self, body: Value, delay: Duration) {
        Mock::given(method("GET"))
            .and(path(STATUS_PATH))
            .and(header("authorization", ID_TOKEN))
            .and(header("content-type", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body).set_delay(delay))
            .mount(&self.backend)
            .await;
    }

    /// Answer the status check with a bare status code.
    pub async fn mount_status_code(&self, status: u16) {
        Mock::given(method("GET"))
            .and(path(STATUS_PATH))
            .respond_with(ResponseTemplate::new(status))
            .mount(&self.backend)
            .await;
    }

    /// Answer deletes with `status`, expecting exactly `times` calls.
    pub async fn mount_delete(&self, status: u16, times: u64) {
        Mock::given(method("DELETE"))
            .and(path(STATUS_PATH))
            .and(header("authorization", ID_TOKEN))
            .respond_with(ResponseTemplate::new(status))
            .expect(times)
            .mount(&self.backend)
            .await;
    }
}

pub fn session(raw: &str) -> SessionId {
    SessionId::parse(raw).unwrap()
}

// ---------------------------------------------------------------------------
// Realtime server side
// ---------------------------------------------------------------------------

async fn next_json(server: &mut ServerEnd) -> Value {
    loop {
        match server.next().await.expect("socket open").expect("frame") {
            Message::Text(text) => return serde_json::from_str(&text).unwrap(),
            _ => continue,
        }
    }
}

/// Read the handshake and return `(subscription id, subscribed session id)`.
pub async fn accept(server: &mut ServerEnd) -> (String, String) {
    assert_eq!(next_json(server).await["type"], "connection_init");

    let start = next_json(server).await;
    assert_eq!(start["type"], "start");
    let data: Value = serde_json::from_str(start["payload"]["data"].as_str().unwrap()).unwrap();

    (
        start["id"].as_str().unwrap().to_string(),
        data["variables"]["sessionId"].as_str().unwrap().to_string(),
    )
}

/// Assert the client sent `stop` for `subscription_id` and closed the socket.
pub async fn assert_stopped_and_closed(server: &mut ServerEnd, subscription_id: &str) {
    assert_eq!(
        next_json(server).await,
        json!({"type": "stop", "id": subscription_id})
    );
    assert!(matches!(server.next().await, Some(Ok(Message::Close(_))) | None));
}

/// Push an `onNotify` event for `subscription_id`.
pub async fn push_notification(
    server: &mut ServerEnd,
    subscription_id: &str,
    session_id: &str,
    message: &str,
) -> Result<(), tokio_tungstenite::tungstenite::Error> {
    let frame = json!({
        "type": "data",
        "id": subscription_id,
        "payload": {"data": {"onNotify": {"message": message, "sessionId": session_id}}}
    });
    server.send(Message::Text(frame.to_string())).await
}
