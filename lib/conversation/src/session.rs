//! Per-user conversation session.
//!
//! A session holds the pointers the assistant needs between messages: which
//! budget is in focus, which ledger the user's budgets live in, and whether
//! a destructive action is waiting for confirmation.

use budget_chat_core::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The kind of action awaiting confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmationKind {
    /// Deleting a whole budget.
    DeleteBudget,
}

/// A destructive action that the user has requested but not yet confirmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingConfirmation {
    /// What will happen on confirmation.
    pub kind: ConfirmationKind,
    /// The budget the action applies to.
    pub target: String,
    /// Last user turn number at which a confirmation is still accepted.
    pub expires_at_turn: u64,
}

impl PendingConfirmation {
    /// Creates a pending budget deletion.
    ///
    /// `requested_at_turn` is the user turn carrying the request; the
    /// confirmation stays live for `window` further user turns.
    #[must_use]
    pub fn delete_budget(target: impl Into<String>, requested_at_turn: u64, window: u64) -> Self {
        Self {
            kind: ConfirmationKind::DeleteBudget,
            target: target.into(),
            expires_at_turn: requested_at_turn.saturating_add(window),
        }
    }

    /// Returns true if a confirmation arriving at `turn` would be honored.
    #[must_use]
    pub fn is_live_at(&self, turn: u64) -> bool {
        turn <= self.expires_at_turn
    }
}

/// A user's conversation session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// The user this session belongs to.
    pub user_id: UserId,
    /// Name of the budget currently in focus.
    pub active_budget: Option<String>,
    /// Handle of the user's ledger.
    pub ledger_handle: Option<String>,
    /// Destructive action awaiting confirmation.
    pub pending_confirmation: Option<PendingConfirmation>,
    /// Number of user turns recorded so far.
    pub user_turns: u64,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
    /// When the session last saw a turn.
    pub last_active_at: DateTime<Utc>,
}

impl Session {
    /// Creates an empty session for a user.
    #[must_use]
    pub fn new(user_id: UserId) -> Self {
        let now = Utc::now();
        Self {
            user_id,
            active_budget: None,
            ledger_handle: None,
            pending_confirmation: None,
            user_turns: 0,
            created_at: now,
            last_active_at: now,
        }
    }

    /// Returns the pending confirmation if it has not expired.
    #[must_use]
    pub fn live_confirmation(&self) -> Option<&PendingConfirmation> {
        self.pending_confirmation
            .as_ref()
            .filter(|p| p.is_live_at(self.user_turns))
    }

    /// Returns true if a pending confirmation exists but has expired.
    #[must_use]
    pub fn has_expired_confirmation(&self) -> bool {
        self.pending_confirmation
            .as_ref()
            .is_some_and(|p| !p.is_live_at(self.user_turns))
    }

    /// Returns true if `name` is the budget in focus.
    #[must_use]
    pub fn is_active(&self, name: &str) -> bool {
        self.active_budget.as_deref() == Some(name)
    }
}
