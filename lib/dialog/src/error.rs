//! Error types for the dialog crate.
//!
//! Handlers return `Result<_, Report<DialogError>>`; collaborator errors are
//! mapped into a variant here and lifted with `?`.

use crate::gateway::GatewayError;
use budget_chat_conversation::SessionError;
use budget_chat_ledger::{LedgerError, RenderError};
use std::fmt;

/// A collaborator failure while handling a turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogError {
    /// The session store failed.
    Session(SessionError),
    /// The ledger store failed.
    Ledger(LedgerError),
    /// The message gateway failed.
    Gateway(GatewayError),
    /// The document renderer failed.
    Render(RenderError),
}

impl fmt::Display for DialogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Session(e) => write!(f, "session store: {e}"),
            Self::Ledger(e) => write!(f, "ledger: {e}"),
            Self::Gateway(e) => write!(f, "gateway: {e}"),
            Self::Render(e) => write!(f, "renderer: {e}"),
        }
    }
}

impl std::error::Error for DialogError {}

impl From<SessionError> for DialogError {
    fn from(e: SessionError) -> Self {
        Self::Session(e)
    }
}

impl From<LedgerError> for DialogError {
    fn from(e: LedgerError) -> Self {
        Self::Ledger(e)
    }
}

impl From<GatewayError> for DialogError {
    fn from(e: GatewayError) -> Self {
        Self::Gateway(e)
    }
}

impl From<RenderError> for DialogError {
    fn from(e: RenderError) -> Self {
        Self::Render(e)
    }
}
