//! Intent handlers.
//!
//! Each handler runs one action for one classified utterance and returns the
//! reply text. Known domain outcomes (a missing budget, a name collision) are
//! turned into replies here; collaborator failures are returned as reports
//! and become an apology at the dispatch boundary.

mod budgets;
mod download;
mod items;

use crate::error::DialogError;
use crate::orchestrator::Orchestrator;
use crate::replies;
use budget_chat_ai::Entities;
use budget_chat_conversation::Session;
use budget_chat_core::UserId;
use rootcause::prelude::Report;
use std::ops::ControlFlow;
use tracing::{info, warn};

pub(crate) type HandlerResult = Result<String, Report<DialogError>>;

/// What a handler knows about the turn it is answering.
pub(crate) struct TurnState<'a> {
    pub user: &'a UserId,
    pub session: &'a Session,
}

impl TurnState<'_> {
    pub fn active_budget(&self) -> Option<&str> {
        self.session.active_budget.as_deref()
    }
}

/// Outcome of resolving the user's ledger.
pub(crate) enum LedgerLookup {
    Found(String),
    /// The phone number is not in the account directory.
    Unregistered,
    /// The account exists but has no ledger assigned.
    NoLedger,
}

impl Orchestrator {
    /// Resolves the ledger handle from the session, then the directory.
    ///
    /// A handle found in the directory is saved to the session.
    pub(crate) async fn resolve_ledger(
        &self,
        state: &TurnState<'_>,
    ) -> Result<LedgerLookup, Report<DialogError>> {
        if let Some(handle) = state.session.ledger_handle.as_deref() {
            return Ok(LedgerLookup::Found(handle.to_string()));
        }

        let Some(account) = self.directory.lookup(state.user.as_str()) else {
            warn!(user = %state.user, "message from unregistered account");
            return Ok(LedgerLookup::Unregistered);
        };
        let Some(handle) = account.ledger_handle() else {
            warn!(account = account.account_id(), "account has no ledger handle");
            return Ok(LedgerLookup::NoLedger);
        };

        self.sessions
            .set_ledger_handle(state.user, handle)
            .await
            .map_err(DialogError::from)?;
        info!(account = account.account_id(), "bound ledger to session");
        Ok(LedgerLookup::Found(handle.to_string()))
    }

    /// Returns the ledger handle if one can be resolved.
    pub(crate) async fn known_ledger(
        &self,
        state: &TurnState<'_>,
    ) -> Result<Option<String>, Report<DialogError>> {
        Ok(match self.resolve_ledger(state).await? {
            LedgerLookup::Found(handle) => Some(handle),
            LedgerLookup::Unregistered | LedgerLookup::NoLedger => None,
        })
    }

    /// Returns `(ledger, active budget)`, or the reply to send when the turn
    /// cannot proceed without one.
    pub(crate) async fn focused_budget(
        &self,
        state: &TurnState<'_>,
    ) -> Result<ControlFlow<String, (String, String)>, Report<DialogError>> {
        let Some(active) = state.active_budget() else {
            return Ok(ControlFlow::Break(replies::NO_ACTIVE_BUDGET.to_string()));
        };
        let Some(ledger) = self.known_ledger(state).await? else {
            return Ok(ControlFlow::Break(replies::NO_BUDGETS_YET.to_string()));
        };
        Ok(ControlFlow::Continue((ledger, active.to_string())))
    }

    pub(crate) async fn set_active(
        &self,
        state: &TurnState<'_>,
        budget: Option<&str>,
    ) -> Result<(), Report<DialogError>> {
        self.sessions
            .set_active_budget(state.user, budget)
            .await
            .map_err(DialogError::from)?;
        Ok(())
    }

    pub(crate) async fn list_budget_names(
        &self,
        ledger: &str,
    ) -> Result<Vec<String>, Report<DialogError>> {
        Ok(self
            .ledger
            .list_budgets(ledger)
            .await
            .map_err(DialogError::from)?)
    }

    /// Picks a budget by name, by a number typed as the name, or by the
    /// selection index.
    pub(crate) fn pick_budget<'a>(
        &self,
        entities: &Entities,
        budgets: &'a [String],
    ) -> Option<&'a str> {
        if let Some(query) = entities.budget_name() {
            return self.find_budget(query, budgets);
        }
        entities
            .selection_index
            .and_then(|index| usize::try_from(index).ok())
            .and_then(|ordinal| ordinal_budget(budgets, ordinal))
    }

    /// Resolves a typed budget name. Names win over list positions, so "2024"
    /// finds "Obra 2024" before it is read as the 2024th entry.
    pub(crate) fn find_budget<'a>(&self, query: &str, budgets: &'a [String]) -> Option<&'a str> {
        self.matcher.find(query, budgets).or_else(|| {
            query
                .trim()
                .parse::<usize>()
                .ok()
                .and_then(|ordinal| ordinal_budget(budgets, ordinal))
        })
    }

    /// Clears a budget that no longer exists and asks the user to pick again.
    pub(crate) async fn budget_vanished(
        &self,
        state: &TurnState<'_>,
        ledger: &str,
        name: &str,
    ) -> HandlerResult {
        warn!(budget = name, "active budget no longer exists");
        if state.session.is_active(name) {
            self.set_active(state, None).await?;
        }
        let budgets = self.list_budget_names(ledger).await?;
        Ok(replies::budget_vanished(name, &budgets))
    }
}

fn ordinal_budget(budgets: &[String], ordinal: usize) -> Option<&str> {
    ordinal
        .checked_sub(1)
        .and_then(|index| budgets.get(index))
        .map(String::as_str)
}
