use chatlogs_core::error::CoreError;

/// Errors from the realtime subscription layer.
#[derive(Debug, thiserror::Error)]
pub enum RealtimeError {
    /// The configured GraphQL endpoint cannot be turned into a realtime URL.
    #[error("Invalid endpoint: {0}")]
    Endpoint(String),

    /// Temporary credentials could not be obtained.
    #[error("Credentials unavailable: {0}")]
    Credentials(String),

    /// The realtime service rejected the signed handshake.
    #[error("Handshake rejected ({status}): {message}")]
    Unauthorized { status: u16, message: String },

    /// Failed to establish or use the WebSocket connection.
    #[error("Connection error: {0}")]
    Connection(String),

    /// The server reported an error on an established connection.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The server closed the socket before a completion arrived.
    #[error("Connection closed by server")]
    Closed,
}

impl From<RealtimeError> for CoreError {
    fn from(err: RealtimeError) -> Self {
        match err {
            RealtimeError::Credentials(_) | RealtimeError::Unauthorized { .. } => {
                CoreError::Auth(err.to_string())
            }
            RealtimeError::Connection(_) | RealtimeError::Closed => {
                CoreError::Transport(err.to_string())
            }
            RealtimeError::Endpoint(_) | RealtimeError::Protocol(_) => {
                CoreError::Internal(err.to_string())
            }
        }
    }
}
