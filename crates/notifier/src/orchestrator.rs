//! One notification flow per session.
//!
//! ```text
//! check_status ── Complete ──> mark available, delete record, success
//!              ── Pending  ──> subscribe ── onNotify ──> (same sequence)
//!              ── NotFound ──> nothing
//! ```
//!
//! Failures never abort the caller; they are surfaced as a warning through
//! the [`NotificationSink`] and returned as [`FlowOutcome::Failed`].

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use chatlogs_core::error::CoreError;
use chatlogs_core::types::{JobStatus, Notification, SessionId, EXPORT_READY_MESSAGE};
use chatlogs_realtime::client::Connector;
use chatlogs_realtime::subscriber::{CompletionSubscriber, SubscriptionCloser, SubscriptionOutcome};
use tokio::time::Instant;

use crate::api::StatusApi;
use crate::sink::NotificationSink;

/// How a call to [`Orchestrator::run`] ended.
#[derive(Debug)]
pub enum FlowOutcome {
    /// No export was requested, or its completion was already consumed.
    NotFound,
    /// The export had already finished when the status was checked.
    Completed,
    /// A completion push arrived while subscribed.
    Notified(Notification),
    /// No push arrived before the subscription deadline.
    TimedOut,
    /// The subscription was cancelled with [`Orchestrator::cancel`].
    Closed,
    /// Another flow for the same session is still in progress.
    AlreadySubscribed,
    /// The status check or the subscription failed; a warning was shown.
    Failed(CoreError),
}

/// State owned by a single `run` call.
#[derive(Clone)]
struct FlowContext {
    session_id: SessionId,
    id_token: Arc<str>,
    started: Instant,
}

/// A flow in progress. `cancelled` is set by [`Orchestrator::cancel`] and
/// stops a flow that has not subscribed yet from subscribing.
#[derive(Default)]
struct FlowEntry {
    cancelled: bool,
    closer: Option<SubscriptionCloser>,
}

type Registry = Arc<Mutex<HashMap<SessionId, FlowEntry>>>;

/// Registry entry for one running flow.
///
/// Dropping it (the `run` future finished or was dropped) removes the entry
/// and closes the subscription, so a session never has two open sockets.
struct ActiveFlow {
    registry: Registry,
    session_id: SessionId,
}

impl ActiveFlow {
    fn claim(registry: &Registry, session_id: &SessionId) -> Option<Self> {
        let mut flows = registry.lock().unwrap_or_else(PoisonError::into_inner);
        if flows.contains_key(session_id) {
            return None;
        }
        flows.insert(session_id.clone(), FlowEntry::default());
        Some(Self {
            registry: Arc::clone(registry),
            session_id: session_id.clone(),
        })
    }

    fn is_cancelled(&self) -> bool {
        self.registry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&self.session_id)
            .map_or(false, |entry| entry.cancelled)
    }

    /// Record the subscription's closer, closing it at once if the flow was
    /// cancelled in the meantime.
    fn attach(&self, closer: SubscriptionCloser) {
        let mut flows = self.registry.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(entry) = flows.get_mut(&self.session_id) {
            if entry.cancelled {
                closer.close();
            }
            entry.closer = Some(closer);
        }
    }
}

impl Drop for ActiveFlow {
    fn drop(&mut self) {
        let entry = self
            .registry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.session_id);
        if let Some(closer) = entry.and_then(|entry| entry.closer) {
            closer.close();
        }
    }
}

/// Runs notification flows, at most one per session at a time.
pub struct Orchestrator<C> {
    status: Arc<StatusApi>,
    subscriber: CompletionSubscriber<C>,
    sink: Arc<dyn NotificationSink>,
    active: Registry,
}

impl<C: Connector> Orchestrator<C> {
    pub fn new(
        status: StatusApi,
        subscriber: CompletionSubscriber<C>,
        sink: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            status: Arc::new(status),
            subscriber,
            sink,
            active: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Whether a flow for `session_id` is in progress.
    pub fn is_active(&self, session_id: &SessionId) -> bool {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(session_id)
    }

    /// Cancel the flow for `session_id`, if one is in progress.
    ///
    /// An open subscription is closed. A flow still checking the status
    /// will not subscribe; a completed export is still reported. Returns
    /// `false` when no flow is in progress.
    pub fn cancel(&self, session_id: &SessionId) -> bool {
        let mut flows = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(entry) = flows.get_mut(session_id) else {
            return false;
        };
        entry.cancelled = true;
        if let Some(closer) = &entry.closer {
            closer.close();
        }
        true
    }

    /// Run the full flow for `session_id` and wait for it to end.
    ///
    /// When the export is still pending this waits for the push or the
    /// subscription deadline.
    pub async fn run(&self, session_id: SessionId, id_token: &str) -> FlowOutcome {
        let Some(flow) = ActiveFlow::claim(&self.active, &session_id) else {
            tracing::info!(session_id = %session_id, "Notification flow already in progress");
            return FlowOutcome::AlreadySubscribed;
        };

        let ctx = FlowContext {
            session_id,
            id_token: Arc::from(id_token),
            started: Instant::now(),
        };

        let outcome = match self.status.check_status(&ctx.session_id, &ctx.id_token).await {
            Ok(JobStatus::NotFound) => FlowOutcome::NotFound,
            Ok(JobStatus::Complete) => {
                finish(&self.status, self.sink.as_ref(), &ctx, EXPORT_READY_MESSAGE).await;
                FlowOutcome::Completed
            }
            Ok(JobStatus::Pending) => self.wait_for_push(&ctx, &flow).await,
            Err(e) => self.fail(&ctx, "Could not check chat log export status", e.into()),
        };

        tracing::info!(
            session_id = %ctx.session_id,
            ?outcome,
            elapsed_ms = ctx.started.elapsed().as_millis() as u64,
            "Notification flow finished",
        );
        outcome
    }

    async fn wait_for_push(&self, ctx: &FlowContext, flow: &ActiveFlow) -> FlowOutcome {
        if flow.is_cancelled() {
            tracing::info!(session_id = %ctx.session_id, "Flow cancelled before subscribing");
            return FlowOutcome::Closed;
        }

        let status = Arc::clone(&self.status);
        let sink = Arc::clone(&self.sink);
        let callback_ctx = ctx.clone();

        let handle = self
            .subscriber
            .subscribe(ctx.session_id.clone(), move |notification| async move {
                finish(&status, sink.as_ref(), &callback_ctx, &notification.message).await;
            });
        flow.attach(handle.closer());

        tracing::info!(
            session_id = %ctx.session_id,
            subscription_id = %handle.subscription_id(),
            "Waiting for export completion",
        );

        match handle.wait().await {
            SubscriptionOutcome::Notified(notification) => FlowOutcome::Notified(notification),
            SubscriptionOutcome::TimedOut => FlowOutcome::TimedOut,
            SubscriptionOutcome::Closed => FlowOutcome::Closed,
            SubscriptionOutcome::Errored(e) => {
                self.fail(ctx, "Lost connection to export notifications", e.into())
            }
        }
    }

    fn fail(&self, ctx: &FlowContext, message: &str, err: CoreError) -> FlowOutcome {
        tracing::warn!(session_id = %ctx.session_id, error = %err, "{message}");
        self.sink.warning(&ctx.session_id, message);
        FlowOutcome::Failed(err)
    }
}

/// Completion sequence shared by the status and push paths.
///
/// A failed delete is reported as a warning and does not suppress the
/// success signal.
async fn finish(status: &StatusApi, sink: &dyn NotificationSink, ctx: &FlowContext, message: &str) {
    sink.mark_available(&ctx.session_id);

    if let Err(e) = status.delete_completion_record(&ctx.id_token).await {
        tracing::warn!(session_id = %ctx.session_id, error = %e, "Failed to delete completion record");
        sink.warning(&ctx.session_id, "Could not clear the completion record");
    }

    sink.success(&ctx.session_id, message);
}
