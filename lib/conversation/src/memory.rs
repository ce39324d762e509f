//! In-memory session store.

use crate::error::SessionError;
use crate::session::{PendingConfirmation, Session};
use crate::store::SessionStore;
use crate::turn::{Turn, TurnRole};
use async_trait::async_trait;
use budget_chat_core::UserId;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;

#[derive(Debug)]
struct Record {
    session: Session,
    turns: Vec<Turn>,
}

impl Record {
    fn new(user: &UserId) -> Self {
        Self {
            session: Session::new(user.clone()),
            turns: Vec::new(),
        }
    }
}

/// Keeps sessions in process memory.
///
/// Used by tests and by single-process deployments without a database.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    records: Mutex<HashMap<UserId, Record>>,
}

impl InMemorySessionStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn records(&self) -> MutexGuard<'_, HashMap<UserId, Record>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn with_record<T>(&self, user: &UserId, f: impl FnOnce(&mut Record) -> T) -> T {
        let mut records = self.records();
        let record = records
            .entry(user.clone())
            .or_insert_with(|| Record::new(user));
        f(record)
    }

    /// Returns the total number of stored turns for a user.
    #[must_use]
    pub fn turn_count(&self, user: &UserId) -> usize {
        self.records().get(user).map_or(0, |r| r.turns.len())
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get_or_create(&self, user: &UserId) -> Result<Session, SessionError> {
        Ok(self.with_record(user, |r| r.session.clone()))
    }

    async fn append_turn(&self, user: &UserId, turn: Turn) -> Result<(), SessionError> {
        self.with_record(user, |r| {
            if turn.role == TurnRole::User {
                r.session.user_turns += 1;
            }
            r.session.last_active_at = Utc::now();
            r.turns.push(turn);
        });
        Ok(())
    }

    async fn recent_turns(&self, user: &UserId, limit: usize) -> Result<Vec<Turn>, SessionError> {
        Ok(self.records().get(user).map_or_else(Vec::new, |r| {
            let start = r.turns.len().saturating_sub(limit);
            r.turns[start..].to_vec()
        }))
    }

    async fn set_active_budget(
        &self,
        user: &UserId,
        budget: Option<&str>,
    ) -> Result<(), SessionError> {
        self.with_record(user, |r| {
            r.session.active_budget = budget.map(str::to_string);
        });
        Ok(())
    }

    async fn set_ledger_handle(&self, user: &UserId, handle: &str) -> Result<(), SessionError> {
        self.with_record(user, |r| {
            r.session.ledger_handle = Some(handle.to_string());
        });
        Ok(())
    }

    async fn set_pending_confirmation(
        &self,
        user: &UserId,
        pending: Option<PendingConfirmation>,
    ) -> Result<(), SessionError> {
        self.with_record(user, |r| {
            r.session.pending_confirmation = pending;
        });
        Ok(())
    }

    async fn trim_history(&self, user: &UserId, keep: usize) -> Result<usize, SessionError> {
        let removed = self.records().get_mut(user).map_or(0, |r| {
            let excess = r.turns.len().saturating_sub(keep);
            r.turns.drain(..excess);
            excess
        });
        if removed > 0 {
            debug!(user = %user, removed, "trimmed conversation history");
        }
        Ok(removed)
    }
}
