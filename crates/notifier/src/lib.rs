//! Client side of export-completion notifications.
//!
//! [`StatusApi`](api::StatusApi) asks the backend whether an export has
//! already finished; [`Orchestrator`](orchestrator::Orchestrator) combines
//! it with a realtime subscription and reports every user-visible signal
//! through a [`NotificationSink`](sink::NotificationSink).

pub mod api;
pub mod config;
pub mod orchestrator;
pub mod sink;
