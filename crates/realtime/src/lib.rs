//! Realtime completion notifications over AppSync WebSocket.
//!
//! Provides SigV4-signed endpoint construction, typed `graphql-ws` message
//! parsing, a [`Connector`](client::Connector) seam for opening sockets,
//! the [`CompletionSubscriber`](subscriber::CompletionSubscriber) state
//! machine, and the backend-side
//! [`CompletionPublisher`](publish::CompletionPublisher) that pushes
//! `sendNotification` mutations.

pub mod client;
pub mod credentials;
pub mod endpoint;
pub mod error;
pub mod memory;
pub mod messages;
pub mod publish;
pub mod signing;
pub mod subscriber;
