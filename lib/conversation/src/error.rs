//! Error types for the conversation crate.

use budget_chat_core::UserId;
use std::fmt;

/// Errors from session store operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Session not found.
    NotFound { user_id: UserId },
    /// Storage operation failed.
    StorageFailed { reason: String },
    /// Stored data could not be decoded.
    Corrupted { reason: String },
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { user_id } => write!(f, "session not found: {user_id}"),
            Self::StorageFailed { reason } => {
                write!(f, "session storage failed: {reason}")
            }
            Self::Corrupted { reason } => {
                write!(f, "session data corrupted: {reason}")
            }
        }
    }
}

impl std::error::Error for SessionError {}
