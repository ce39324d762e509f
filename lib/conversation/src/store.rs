//! Session storage contract.

use crate::error::SessionError;
use crate::session::{PendingConfirmation, Session};
use crate::turn::Turn;
use async_trait::async_trait;
use budget_chat_core::UserId;

/// Persists sessions and conversation turns.
///
/// All operations are keyed by user. Implementations must create the session
/// on first use so callers never have to check for existence.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Loads a user's session, creating an empty one if none exists.
    async fn get_or_create(&self, user: &UserId) -> Result<Session, SessionError>;

    /// Appends a turn to the user's log.
    ///
    /// User turns increment the session's `user_turns` counter. Both roles
    /// refresh `last_active_at`.
    async fn append_turn(&self, user: &UserId, turn: Turn) -> Result<(), SessionError>;

    /// Returns up to `limit` most recent turns, oldest first.
    async fn recent_turns(&self, user: &UserId, limit: usize) -> Result<Vec<Turn>, SessionError>;

    /// Sets or clears the active budget.
    async fn set_active_budget(
        &self,
        user: &UserId,
        budget: Option<&str>,
    ) -> Result<(), SessionError>;

    /// Records the ledger handle for the user.
    async fn set_ledger_handle(&self, user: &UserId, handle: &str) -> Result<(), SessionError>;

    /// Sets or clears the pending confirmation.
    async fn set_pending_confirmation(
        &self,
        user: &UserId,
        pending: Option<PendingConfirmation>,
    ) -> Result<(), SessionError>;

    /// Drops all but the `keep` most recent turns. Returns how many were removed.
    async fn trim_history(&self, user: &UserId, keep: usize) -> Result<usize, SessionError>;
}
