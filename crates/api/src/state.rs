use chatlogs_queue::submitter::JobSubmitter;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable; the queue publisher sits behind an `Arc`. Server
/// settings are consumed when the router is built and are not kept here.
#[derive(Clone)]
pub struct AppState {
    /// Publishes export requests onto the work queue.
    pub submitter: JobSubmitter,
}
