use std::time::Duration;

/// Error taxonomy shared by every component of the notification flow.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Client-correctable input problem (400-class).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Expired or invalid credentials or identity token.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Network or socket failure.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Unexpected backend failure (500-class).
    #[error("Internal error: {0}")]
    Internal(String),

    /// No completion signal arrived within the deadline.
    #[error("Timed out after {}s", .0.as_secs())]
    Timeout(Duration),
}
