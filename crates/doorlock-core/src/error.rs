use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // Keypad input errors
    #[error("Invalid digit: {0} (expected 0-9)")]
    InvalidDigit(u8),

    #[error("Invalid keypad key: {0:?}")]
    InvalidKey(char),

    #[error("Invalid admin menu option: {0} (expected 1-5)")]
    InvalidMenuOption(u8),

    // Credential errors
    #[error("Invalid password: {reason}")]
    InvalidPassword { reason: String },

    #[error("Credential store full ({capacity} users)")]
    StoreFull { capacity: usize },

    // State machine errors
    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    // Fingerprint simulation errors
    #[error("Invalid fingerprint outcome: {0}")]
    InvalidFingerprintOutcome(String),

    // Display errors
    #[error("Invalid display line {line} (max {max})")]
    InvalidLine { line: usize, max: usize },

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Create a new invalid password error.
    pub fn invalid_password(reason: impl Into<String>) -> Self {
        Self::InvalidPassword {
            reason: reason.into(),
        }
    }

    /// Create a new configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
