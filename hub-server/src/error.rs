//! Error types for the hub server.

/// Errors raised while starting or stopping a [`crate::HubServer`].
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("No available port found in range {start}-{end}")]
    NoAvailablePort { start: u16, end: u16 },

    #[error("Server failed to start: {0}")]
    Startup(String),

    #[error("Server task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
