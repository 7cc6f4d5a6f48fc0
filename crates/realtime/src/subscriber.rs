//! Completion subscription state machine.
//!
//! One [`SubscriptionHandle`] drives exactly one socket through
//!
//! ```text
//! Connecting -> Initialized -> Subscribed -> Notified | TimedOut | Errored | Closed
//! ```
//!
//! The state lives in a `watch` channel and is the single source of truth;
//! the socket is owned by the spawned task and dropped when the task ends.
//! The deadline starts when [`CompletionSubscriber::subscribe`] is called,
//! so it also bounds connecting, and is not extended by keep-alives or
//! unrelated frames. A client-side end sends `stop` before closing.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use chatlogs_core::types::{Notification, SessionId, EXPORT_READY_MESSAGE};
use futures::{SinkExt, StreamExt};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Sleep;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_util::sync::CancellationToken;

use crate::client::Connector;
use crate::error::RealtimeError;
use crate::messages::{parse_message, ClientMessage, OnNotifyEvent, ServerMessage};

/// How long a subscription waits for a completion push.
pub const DEFAULT_SUBSCRIPTION_TIMEOUT: Duration = Duration::from_secs(180);

/// Lifecycle of a single subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionState {
    Connecting,
    Initialized,
    Subscribed,
    Notified,
    TimedOut,
    Errored,
    Closed,
}

impl SubscriptionState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Notified | Self::TimedOut | Self::Errored | Self::Closed
        )
    }
}

/// How a subscription ended.
#[derive(Debug)]
pub enum SubscriptionOutcome {
    /// A completion arrived and `on_complete` ran.
    Notified(Notification),
    /// No completion within the deadline.
    TimedOut,
    /// Connecting or reading the socket failed.
    Errored(RealtimeError),
    /// [`SubscriptionHandle::close`] was called.
    Closed,
}

impl SubscriptionOutcome {
    pub fn state(&self) -> SubscriptionState {
        match self {
            Self::Notified(_) => SubscriptionState::Notified,
            Self::TimedOut => SubscriptionState::TimedOut,
            Self::Errored(_) => SubscriptionState::Errored,
            Self::Closed => SubscriptionState::Closed,
        }
    }
}

/// Opens completion subscriptions through a [`Connector`].
pub struct CompletionSubscriber<C> {
    connector: Arc<C>,
    timeout: Duration,
}

impl<C: Connector> CompletionSubscriber<C> {
    pub fn new(connector: Arc<C>) -> Self {
        Self::with_timeout(connector, DEFAULT_SUBSCRIPTION_TIMEOUT)
    }

    pub fn with_timeout(connector: Arc<C>, timeout: Duration) -> Self {
        Self { connector, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Start a subscription for `session_id`.
    ///
    /// Returns immediately; connecting happens on a spawned task. When a
    /// matching `onNotify` event arrives the socket is closed and
    /// `on_complete` is awaited exactly once. It is never called on
    /// timeout, error, or close.
    pub fn subscribe<F, Fut>(&self, session_id: SessionId, on_complete: F) -> SubscriptionHandle
    where
        F: FnOnce(Notification) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let subscription_id = uuid::Uuid::new_v4().to_string();
        let (state_tx, state_rx) = watch::channel(SubscriptionState::Connecting);
        let cancel = CancellationToken::new();

        let session = SubscriptionSession {
            session_id: session_id.clone(),
            subscription_id: subscription_id.clone(),
            timeout: self.timeout,
            cancel: cancel.clone(),
            state: state_tx,
        };
        let connector = Arc::clone(&self.connector);

        let task = tokio::spawn(async move {
            let outcome = session.run(connector.as_ref()).await;
            if let SubscriptionOutcome::Notified(ref notification) = outcome {
                on_complete(notification.clone()).await;
            }
            outcome
        });

        SubscriptionHandle {
            session_id,
            subscription_id,
            state: state_rx,
            cancel,
            task,
        }
    }
}

/// Exclusive handle to one running subscription.
///
/// Dropping the handle does not stop the subscription; it still ends on
/// notification, error, or the deadline.
pub struct SubscriptionHandle {
    session_id: SessionId,
    subscription_id: String,
    state: watch::Receiver<SubscriptionState>,
    cancel: CancellationToken,
    task: JoinHandle<SubscriptionOutcome>,
}

impl SubscriptionHandle {
    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// Locally generated id sent in the `start` frame.
    pub fn subscription_id(&self) -> &str {
        &self.subscription_id
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SubscriptionState {
        *self.state.borrow()
    }

    /// Close the subscription. Safe to call any number of times; has no
    /// effect once the subscription has ended.
    pub fn close(&self) {
        self.cancel.cancel();
    }

    /// A detached closer that outlives [`wait`](Self::wait).
    pub fn closer(&self) -> SubscriptionCloser {
        SubscriptionCloser(self.cancel.clone())
    }

    /// Wait for the subscription to end.
    pub async fn wait(self) -> SubscriptionOutcome {
        match self.task.await {
            Ok(outcome) => outcome,
            Err(e) => SubscriptionOutcome::Errored(RealtimeError::Protocol(format!(
                "subscription task failed: {e}"
            ))),
        }
    }
}

/// Closes one subscription from outside its owner.
#[derive(Debug, Clone)]
pub struct SubscriptionCloser(CancellationToken);

impl SubscriptionCloser {
    pub fn close(&self) {
        self.0.cancel();
    }
}

/// Everything the subscription task owns.
struct SubscriptionSession {
    session_id: SessionId,
    subscription_id: String,
    timeout: Duration,
    cancel: CancellationToken,
    state: watch::Sender<SubscriptionState>,
}

impl SubscriptionSession {
    async fn run<C: Connector>(&self, connector: &C) -> SubscriptionOutcome {
        let deadline = tokio::time::sleep(self.timeout);
        tokio::pin!(deadline);

        let connected = tokio::select! {
            _ = self.cancel.cancelled() => Err(SubscriptionOutcome::Closed),
            _ = &mut deadline => {
                self.log_timeout("Subscription timeout reached before connecting");
                Err(SubscriptionOutcome::TimedOut)
            }
            result = connector.connect() => result.map_err(|e| {
                tracing::error!(session_id = %self.session_id, error = %e, "Realtime connection failed");
                SubscriptionOutcome::Errored(e)
            }),
        };

        let outcome = match connected {
            Ok(ws) => self.drive(ws, deadline.as_mut()).await,
            Err(outcome) => outcome,
        };

        self.state.send_replace(outcome.state());
        tracing::info!(
            session_id = %self.session_id,
            subscription_id = %self.subscription_id,
            state = ?outcome.state(),
            "Subscription ended",
        );
        outcome
    }

    /// Run the protocol over an open socket until a terminal state.
    async fn drive<S>(&self, ws: S, mut deadline: Pin<&mut Sleep>) -> SubscriptionOutcome
    where
        S: futures::Stream<Item = Result<Message, WsError>>
            + futures::Sink<Message, Error = WsError>
            + Unpin,
    {
        let (mut sink, mut stream) = ws.split();

        if let Err(e) = sink.send(Message::Text(ClientMessage::ConnectionInit.to_text())).await {
            return SubscriptionOutcome::Errored(RealtimeError::Connection(e.to_string()));
        }
        self.state.send_replace(SubscriptionState::Initialized);

        let start = ClientMessage::start_on_notify(&self.subscription_id, &self.session_id);
        if let Err(e) = sink.send(Message::Text(start.to_text())).await {
            let _ = sink.close().await;
            return SubscriptionOutcome::Errored(RealtimeError::Connection(e.to_string()));
        }
        self.state.send_replace(SubscriptionState::Subscribed);
        tracing::info!(
            session_id = %self.session_id,
            subscription_id = %self.subscription_id,
            "Subscribed to completion notifications",
        );

        let outcome = loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    tracing::debug!(session_id = %self.session_id, "Subscription closed by owner");
                    break SubscriptionOutcome::Closed;
                }
                _ = &mut deadline => {
                    self.log_timeout("Subscription timeout reached, closing connection");
                    break SubscriptionOutcome::TimedOut;
                }
                frame = stream.next() => {
                    if let Some(outcome) = self.handle_frame(frame) {
                        break outcome;
                    }
                }
            }
        };

        // The server already tore the subscription down on an error.
        if !matches!(outcome, SubscriptionOutcome::Errored(_)) {
            let stop = ClientMessage::Stop {
                id: self.subscription_id.clone(),
            };
            if let Err(e) = sink.send(Message::Text(stop.to_text())).await {
                tracing::debug!(session_id = %self.session_id, error = %e, "Failed to send stop");
            }
        }

        // Close without waiting for the server's reply.
        let _ = sink.close().await;
        outcome
    }

    fn log_timeout(&self, message: &str) {
        tracing::warn!(
            session_id = %self.session_id,
            timeout_secs = self.timeout.as_secs(),
            "{message}",
        );
    }

    /// Returns `Some` when the frame ends the subscription.
    fn handle_frame(&self, frame: Option<Result<Message, WsError>>) -> Option<SubscriptionOutcome> {
        match frame {
            Some(Ok(Message::Text(text))) => self.handle_text(&text),
            Some(Ok(Message::Close(frame))) => {
                tracing::info!(session_id = %self.session_id, ?frame, "Realtime socket closed by server");
                Some(SubscriptionOutcome::Errored(RealtimeError::Closed))
            }
            Some(Ok(_)) => None,
            Some(Err(e)) => {
                tracing::error!(session_id = %self.session_id, error = %e, "Realtime socket error");
                Some(SubscriptionOutcome::Errored(RealtimeError::Connection(e.to_string())))
            }
            None => Some(SubscriptionOutcome::Errored(RealtimeError::Closed)),
        }
    }

    fn handle_text(&self, text: &str) -> Option<SubscriptionOutcome> {
        let msg = match parse_message(text) {
            Ok(msg) => msg,
            Err(e) => {
                tracing::warn!(error = %e, raw_message = %text, "Failed to parse realtime message");
                return None;
            }
        };

        match msg {
            ServerMessage::Data { ref id, .. } => {
                if !self.is_ours(id.as_deref()) {
                    tracing::debug!(?id, "Ignoring data for another subscription");
                    return None;
                }
                match msg.on_notify() {
                    Some(event) => Some(SubscriptionOutcome::Notified(self.notification(event))),
                    None => {
                        tracing::debug!(session_id = %self.session_id, "Data frame without onNotify");
                        None
                    }
                }
            }
            ServerMessage::Error { id, payload } if self.is_ours(id.as_deref()) => {
                tracing::error!(session_id = %self.session_id, %payload, "Subscription rejected");
                Some(SubscriptionOutcome::Errored(RealtimeError::Protocol(payload.to_string())))
            }
            ServerMessage::ConnectionError { payload } => {
                tracing::error!(session_id = %self.session_id, %payload, "Realtime connection rejected");
                Some(SubscriptionOutcome::Errored(RealtimeError::Protocol(payload.to_string())))
            }
            ServerMessage::Complete { id } if self.is_ours(id.as_deref()) => {
                Some(SubscriptionOutcome::Errored(RealtimeError::Protocol(
                    "subscription completed by server".into(),
                )))
            }
            ServerMessage::ConnectionAck { .. } => {
                tracing::debug!(session_id = %self.session_id, "Realtime connection acknowledged");
                None
            }
            ServerMessage::StartAck { .. } => {
                tracing::debug!(session_id = %self.session_id, "Subscription acknowledged");
                None
            }
            ServerMessage::KeepAlive => None,
            other => {
                tracing::debug!(?other, "Ignoring realtime message");
                None
            }
        }
    }

    /// Frames without an id are treated as addressed to us.
    fn is_ours(&self, id: Option<&str>) -> bool {
        id.map_or(true, |id| id == self.subscription_id)
    }

    fn notification(&self, event: &OnNotifyEvent) -> Notification {
        Notification {
            session_id: self.session_id.clone(),
            message: event
                .message
                .clone()
                .unwrap_or_else(|| EXPORT_READY_MESSAGE.to_string()),
        }
    }
}
