//! In-process realtime connector.
//!
//! [`MemoryConnector`] opens WebSocket streams over `tokio::io::duplex`
//! pipes and hands the server half of each one to the owner through a
//! channel, so the subscription protocol can be driven without a network.
//! Used by the realtime and notifier test suites.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::io::DuplexStream;
use tokio::sync::{mpsc, Mutex};
use tokio_tungstenite::tungstenite::protocol::Role;
use tokio_tungstenite::WebSocketStream;

use crate::client::Connector;
use crate::error::RealtimeError;

/// Buffer size of each in-memory pipe.
const PIPE_CAPACITY: usize = 64 * 1024;

/// Server half of an in-memory socket.
pub type ServerEnd = WebSocketStream<DuplexStream>;

pub struct MemoryConnector {
    server_tx: mpsc::UnboundedSender<ServerEnd>,
    opened: AtomicUsize,
    /// Errors to return from the next `connect` calls, in order.
    failures: Mutex<Vec<RealtimeError>>,
}

impl MemoryConnector {
    /// Create a connector and the receiver that yields server ends.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ServerEnd>) {
        let (server_tx, server_rx) = mpsc::unbounded_channel();
        let connector = Self {
            server_tx,
            opened: AtomicUsize::new(0),
            failures: Mutex::new(Vec::new()),
        };
        (connector, server_rx)
    }

    /// Make the next `connect` call fail with `err`.
    pub async fn fail_next(&self, err: RealtimeError) {
        self.failures.lock().await.push(err);
    }

    /// Number of sockets opened so far.
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    type Stream = WebSocketStream<DuplexStream>;

    async fn connect(&self) -> Result<Self::Stream, RealtimeError> {
        {
            let mut failures = self.failures.lock().await;
            if !failures.is_empty() {
                return Err(failures.remove(0));
            }
        }

        let (client, server) = tokio::io::duplex(PIPE_CAPACITY);
        let client = WebSocketStream::from_raw_socket(client, Role::Client, None).await;
        let server = WebSocketStream::from_raw_socket(server, Role::Server, None).await;

        self.server_tx
            .send(server)
            .map_err(|_| RealtimeError::Connection("in-memory server end dropped".into()))?;
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(client)
    }
}
