//! WebSocket session error types
//!
//! Every error here is converted into an `{"error": ...}` message at the
//! session boundary. Only authentication errors end the session.

use thiserror::Error;

use crate::core::calibration::CalibrationError;
use crate::errors::auth_error::AuthError;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Invalid message format")]
    InvalidMessage,

    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("Command not available on this channel: {0}")]
    CommandNotAvailable(String),

    #[error("Missing field: {0}")]
    MissingField(&'static str),

    #[error("Invalid orientation: {0}")]
    InvalidOrientation(String),

    #[error("{0}")]
    Calibration(#[from] CalibrationError),

    #[error("Authentication token required")]
    MissingToken,

    #[error("{0}")]
    Auth(#[from] AuthError),

    /// Internal failure; the detail is logged, never sent
    #[error("Internal server error")]
    Internal(String),
}

impl SessionError {
    /// Text sent to the client
    pub fn to_message(&self) -> String {
        self.to_string()
    }

    /// Whether the session must be closed with a policy violation
    pub fn is_fatal(&self) -> bool {
        matches!(self, SessionError::MissingToken | SessionError::Auth(_))
    }
}

/// Result type for WebSocket operations
pub type SessionResult<T> = Result<T, SessionError>;
