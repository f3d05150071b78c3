//! Error types for the lock service.

/// Result type alias for service operations.
pub type Result<T> = std::result::Result<T, ServiceError>;

/// Errors that can occur while talking to the lock service.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// The service task has stopped and no longer accepts commands.
    #[error("Lock service is not running")]
    Stopped,

    /// The service dropped a command without replying.
    #[error("Lock service dropped the reply to {command}")]
    NoReply { command: &'static str },

    /// The controller could not be built.
    #[error("Controller error: {0}")]
    Controller(#[from] doorlock_core::Error),

    /// The service task panicked or was aborted.
    #[error("Service task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl ServiceError {
    /// Create a new missing-reply error.
    pub fn no_reply(command: &'static str) -> Self {
        Self::NoReply { command }
    }
}
