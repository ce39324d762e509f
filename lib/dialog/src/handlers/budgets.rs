//! Budget lifecycle: create, list, switch and the two-phase delete.

use super::{HandlerResult, LedgerLookup, TurnState};
use crate::error::DialogError;
use crate::orchestrator::Orchestrator;
use crate::replies;
use budget_chat_ai::Entities;
use budget_chat_conversation::PendingConfirmation;
use budget_chat_ledger::{BudgetSummary, LedgerError, same_budget_name};
use tracing::{info, instrument};

impl Orchestrator {
    #[instrument(skip_all, fields(user = %state.user))]
    pub(crate) async fn create_budget(
        &self,
        state: &TurnState<'_>,
        entities: &Entities,
    ) -> HandlerResult {
        let Some(name) = entities.budget_name() else {
            return Ok(replies::ASK_BUDGET_NAME.to_string());
        };

        let ledger = match self.resolve_ledger(state).await? {
            LedgerLookup::Found(handle) => handle,
            LedgerLookup::Unregistered => return Ok(replies::UNREGISTERED_ACCOUNT.to_string()),
            LedgerLookup::NoLedger => return Ok(replies::MISSING_LEDGER.to_string()),
        };

        match self.ledger.create_budget(&ledger, name).await {
            Ok(()) => {}
            Err(LedgerError::NameCollision { .. }) => return Ok(replies::name_collision(name)),
            Err(e) => return Err(DialogError::from(e).into()),
        }
        self.set_active(state, Some(name)).await?;

        info!(budget = name, "created budget");
        Ok(replies::budget_created(name))
    }

    #[instrument(skip_all, fields(user = %state.user))]
    pub(crate) async fn list_budgets(&self, state: &TurnState<'_>) -> HandlerResult {
        let Some(ledger) = self.known_ledger(state).await? else {
            return Ok(replies::NO_BUDGETS_YET.to_string());
        };
        let budgets = self.list_budget_names(&ledger).await?;
        if budgets.is_empty() {
            return Ok(replies::NO_BUDGETS_OFFER.to_string());
        }

        let mut active = state.active_budget();
        if active.is_some_and(|a| !budgets.iter().any(|b| b == a)) {
            self.set_active(state, None).await?;
            active = None;
        }
        Ok(replies::budgets_overview(&budgets, active))
    }

    #[instrument(skip_all, fields(user = %state.user))]
    pub(crate) async fn change_budget(
        &self,
        state: &TurnState<'_>,
        entities: &Entities,
    ) -> HandlerResult {
        let Some(ledger) = self.known_ledger(state).await? else {
            return Ok(replies::NO_BUDGETS_YET.to_string());
        };
        let budgets = self.list_budget_names(&ledger).await?;
        if budgets.is_empty() {
            return Ok(replies::NO_BUDGETS_OFFER.to_string());
        }

        match (self.pick_budget(entities, &budgets), entities.budget_name()) {
            (Some(budget), _) => {
                self.set_active(state, Some(budget)).await?;
                info!(budget, "switched budget");
                Ok(replies::budget_switched(budget))
            }
            (None, Some(query)) => Ok(replies::budget_not_found(
                query,
                &budgets,
                state.active_budget(),
            )),
            (None, None) => Ok(replies::ask_which_budget(&budgets, state.active_budget())),
        }
    }

    /// First phase of a budget deletion: resolve the target and ask for
    /// confirmation. Replaces any earlier pending deletion.
    #[instrument(skip_all, fields(user = %state.user))]
    pub(crate) async fn request_budget_deletion(
        &self,
        state: &TurnState<'_>,
        entities: &Entities,
    ) -> HandlerResult {
        let Some(ledger) = self.known_ledger(state).await? else {
            return Ok(replies::NO_BUDGETS_TO_DELETE.to_string());
        };
        let budgets = self.list_budget_names(&ledger).await?;
        if budgets.is_empty() {
            return Ok(replies::NO_BUDGETS_TO_DELETE.to_string());
        }

        let Some(target) = self.pick_budget(entities, &budgets) else {
            return Ok(match entities.budget_name() {
                Some(query) => replies::budget_not_found(query, &budgets, state.active_budget()),
                None => replies::ask_budget_to_delete(&budgets, state.active_budget()),
            });
        };

        let items = self
            .ledger
            .get_items(&ledger, target)
            .await
            .map_err(DialogError::from)?;
        let summary = BudgetSummary::from_items(&items);

        let pending = PendingConfirmation::delete_budget(
            target,
            state.session.user_turns,
            self.config.confirmation_window_turns,
        );
        info!(
            budget = target,
            expires_at_turn = pending.expires_at_turn,
            "budget deletion awaiting confirmation"
        );
        self.sessions
            .set_pending_confirmation(state.user, Some(pending))
            .await
            .map_err(DialogError::from)?;

        Ok(replies::confirm_budget_deletion(target, &summary))
    }

    /// Second phase of a budget deletion.
    ///
    /// A failed delete keeps the confirmation pending so the user can retry.
    #[instrument(skip_all, fields(user = %state.user))]
    pub(crate) async fn confirm_budget_deletion(&self, state: &TurnState<'_>) -> HandlerResult {
        let Some(pending) = state.session.live_confirmation() else {
            return Ok(replies::NOTHING_PENDING.to_string());
        };
        let Some(ledger) = self.known_ledger(state).await? else {
            return Ok(replies::NOTHING_PENDING.to_string());
        };
        let target = pending.target.as_str();

        let reply = match self.ledger.delete_budget(&ledger, target).await {
            Ok(()) => {
                info!(budget = target, "deleted budget");
                replies::budget_deleted(target)
            }
            Err(LedgerError::BudgetNotFound { .. }) => {
                let budgets = self.list_budget_names(&ledger).await?;
                replies::budget_vanished(target, &budgets)
            }
            Err(e) => return Err(DialogError::from(e).into()),
        };

        self.sessions
            .set_pending_confirmation(state.user, None)
            .await
            .map_err(DialogError::from)?;
        if state
            .active_budget()
            .is_some_and(|active| same_budget_name(active, target))
        {
            self.set_active(state, None).await?;
        }
        Ok(reply)
    }

    #[instrument(skip_all, fields(user = %state.user))]
    pub(crate) async fn cancel_pending(&self, state: &TurnState<'_>) -> HandlerResult {
        let Some(pending) = state.session.live_confirmation() else {
            return Ok(replies::NOTHING_TO_CANCEL.to_string());
        };
        self.sessions
            .set_pending_confirmation(state.user, None)
            .await
            .map_err(DialogError::from)?;
        info!(budget = %pending.target, "budget deletion cancelled");
        Ok(replies::deletion_cancelled(&pending.target))
    }
}

#[cfg(test)]
mod tests {
    use crate::replies;
    use crate::test_support::{Harness, LEDGER, PHONE, named};
    use budget_chat_accounts::{Account, StaticDirectory};
    use budget_chat_ai::{Entities, Intent};
    use budget_chat_ledger::LineItem;

    #[tokio::test]
    async fn create_then_list_contains_budget() {
        let harness = Harness::new();
        harness.classify(Intent::CreateBudget, named("X"));
        harness.classify(Intent::ListBudgets, Entities::default());

        let created = harness.process("crear presupuesto X").await;
        let listed = harness.process("mis presupuestos").await;

        assert!(created.starts_with("✅ Presupuesto \"X\" creado"));
        assert_eq!(harness.ledger_budgets().await, vec!["X".to_string()]);
        assert_eq!(harness.session().await.active_budget.as_deref(), Some("X"));
        assert!(listed.contains("1. X ✅ ACTIVO"));
    }

    #[tokio::test]
    async fn create_without_name_asks_for_one() {
        let harness = Harness::new();
        harness.classify(Intent::CreateBudget, Entities::default());

        let reply = harness.process("quiero un presupuesto").await;

        assert_eq!(reply, replies::ASK_BUDGET_NAME);
        assert!(harness.ledger_budgets().await.is_empty());
    }

    #[tokio::test]
    async fn create_reports_name_collision() {
        let harness = Harness::new();
        harness.budget("Casa", vec![]).await;
        harness.classify(Intent::CreateBudget, named("casa"));

        let reply = harness.process("crear casa").await;

        assert_eq!(reply, replies::name_collision("casa"));
        assert!(harness.session().await.active_budget.is_none());
    }

    #[tokio::test]
    async fn create_for_unregistered_account_is_terminal() {
        let harness = Harness::with_directory(StaticDirectory::default());
        harness.classify(Intent::CreateBudget, named("Casa"));

        let reply = harness.process("crear Casa").await;

        assert_eq!(reply, replies::UNREGISTERED_ACCOUNT);
    }

    #[tokio::test]
    async fn create_for_account_without_ledger_is_terminal() {
        let directory = StaticDirectory::new(vec![Account::new("Ashly", PHONE)]);
        let harness = Harness::with_directory(directory);
        harness.classify(Intent::CreateBudget, named("Casa"));

        let reply = harness.process("crear Casa").await;

        assert_eq!(reply, replies::MISSING_LEDGER);
    }

    #[tokio::test]
    async fn ledger_handle_is_saved_to_session() {
        let harness = Harness::new();
        harness.classify(Intent::CreateBudget, named("Casa"));

        harness.process("crear Casa").await;

        assert_eq!(
            harness.session().await.ledger_handle.as_deref(),
            Some(LEDGER)
        );
    }

    #[tokio::test]
    async fn change_by_partial_name_is_case_insensitive() {
        let harness = Harness::new();
        harness.budget("Obra Norte", vec![]).await;
        harness.budget("Casa Ashly", vec![]).await;
        harness.classify(Intent::ChangeBudget, named("casa"));

        let reply = harness.process("cambiar a casa").await;

        assert_eq!(reply, replies::budget_switched("Casa Ashly"));
        assert_eq!(
            harness.session().await.active_budget.as_deref(),
            Some("Casa Ashly")
        );
    }

    #[tokio::test]
    async fn change_by_ordinal() {
        let harness = Harness::new();
        harness.budget("Casa", vec![]).await;
        harness.budget("Obra", vec![]).await;
        harness.classify(
            Intent::ChangeBudget,
            Entities {
                selection_index: Some(2),
                ..Entities::default()
            },
        );
        harness.classify(Intent::ChangeBudget, named("1"));

        harness.process("el 2").await;
        assert_eq!(harness.session().await.active_budget.as_deref(), Some("Obra"));

        harness.process("1").await;
        assert_eq!(harness.session().await.active_budget.as_deref(), Some("Casa"));
    }

    #[tokio::test]
    async fn change_by_year_in_name_prefers_name_over_position() {
        let harness = Harness::new();
        harness.budget("Casa", vec![]).await;
        harness.budget("Obra 2024", vec![]).await;
        harness.classify(Intent::ChangeBudget, named("2024"));

        let reply = harness.process("cambiar a 2024").await;

        assert_eq!(reply, replies::budget_switched("Obra 2024"));
        assert_eq!(
            harness.session().await.active_budget.as_deref(),
            Some("Obra 2024")
        );
    }

    #[tokio::test]
    async fn change_to_unknown_budget_lists_budgets() {
        let harness = Harness::new();
        harness.budget("Casa", vec![]).await;
        harness.classify(Intent::ChangeBudget, named("oficina"));

        let reply = harness.process("cambiar a oficina").await;

        assert!(reply.starts_with("❌ No encontré un presupuesto llamado \"oficina\""));
        assert!(reply.contains("1. Casa"));
        assert!(harness.session().await.active_budget.is_none());
    }

    #[tokio::test]
    async fn list_drops_vanished_active_budget() {
        let harness = Harness::new();
        harness.budget("Obra", vec![]).await;
        harness.activate("Casa").await;
        harness.classify(Intent::ListBudgets, Entities::default());

        let reply = harness.process("mis presupuestos").await;

        assert!(!reply.contains("ACTIVO"));
        assert!(harness.session().await.active_budget.is_none());
    }

    #[tokio::test]
    async fn confirm_without_request_reports_nothing_pending() {
        let harness = Harness::new();
        harness.budget("Casa", vec![]).await;
        harness.classify(Intent::ConfirmDelete, Entities::default());

        let reply = harness.process("sí").await;

        assert_eq!(reply, replies::NOTHING_PENDING);
        assert_eq!(harness.ledger_budgets().await, vec!["Casa".to_string()]);
    }

    #[tokio::test]
    async fn delete_then_confirm_removes_only_target() {
        let harness = Harness::new();
        harness.budget("X", vec![LineItem::new("cemento", 2.0, 1000)]).await;
        harness.budget("Y", vec![]).await;
        harness.activate("X").await;
        harness.classify(Intent::DeleteBudget, named("X"));
        harness.classify(Intent::ConfirmDelete, Entities::default());

        let prompt = harness.process("borrar X").await;
        assert!(prompt.contains("📊 1 items · $2.000"));
        assert!(prompt.contains("Responde SI para confirmar o NO para cancelar"));
        assert_eq!(harness.ledger_budgets().await.len(), 2);

        let reply = harness.process("sí").await;

        assert_eq!(reply, replies::budget_deleted("X"));
        assert_eq!(harness.ledger_budgets().await, vec!["Y".to_string()]);
        let session = harness.session().await;
        assert!(session.active_budget.is_none());
        assert!(session.pending_confirmation.is_none());
    }

    #[tokio::test]
    async fn confirm_keeps_unrelated_active_budget() {
        let harness = Harness::new();
        harness.budget("X", vec![]).await;
        harness.budget("Y", vec![]).await;
        harness.activate("Y").await;
        harness.classify(Intent::DeleteBudget, named("X"));
        harness.classify(Intent::ConfirmDelete, Entities::default());

        harness.process("borrar X").await;
        harness.process("sí").await;

        assert_eq!(harness.session().await.active_budget.as_deref(), Some("Y"));
    }

    #[tokio::test]
    async fn unrelated_turn_keeps_pending_deletion() {
        let harness = Harness::new();
        harness.budget("X", vec![]).await;
        harness.classify(Intent::DeleteBudget, named("X"));
        harness.classify(Intent::Greeting, Entities::default());
        harness.classify(Intent::ConfirmDelete, Entities::default());

        harness.process("borrar X").await;
        harness.process("hola").await;
        let reply = harness.process("sí").await;

        assert_eq!(reply, replies::budget_deleted("X"));
        assert!(harness.ledger_budgets().await.is_empty());
    }

    #[tokio::test]
    async fn pending_deletion_expires_after_window() {
        let harness = Harness::new();
        harness.budget("X", vec![]).await;
        harness.classify(Intent::DeleteBudget, named("X"));
        for _ in 0..5 {
            harness.classify(Intent::Greeting, Entities::default());
        }
        harness.classify(Intent::ConfirmDelete, Entities::default());

        harness.process("borrar X").await;
        for _ in 0..5 {
            harness.process("hola").await;
        }
        let reply = harness.process("sí").await;

        assert_eq!(reply, replies::NOTHING_PENDING);
        assert_eq!(harness.ledger_budgets().await, vec!["X".to_string()]);
        assert!(harness.session().await.pending_confirmation.is_none());
    }

    #[tokio::test]
    async fn cancel_clears_pending_deletion() {
        let harness = Harness::new();
        harness.budget("X", vec![]).await;
        harness.classify(Intent::DeleteBudget, named("X"));
        harness.classify(Intent::CancelPending, Entities::default());
        harness.classify(Intent::ConfirmDelete, Entities::default());

        harness.process("borrar X").await;
        let cancelled = harness.process("no").await;
        let confirmed = harness.process("sí").await;

        assert_eq!(cancelled, replies::deletion_cancelled("X"));
        assert_eq!(confirmed, replies::NOTHING_PENDING);
        assert_eq!(harness.ledger_budgets().await, vec!["X".to_string()]);
    }

    #[tokio::test]
    async fn delete_without_target_lists_budgets() {
        let harness = Harness::new();
        harness.budget("X", vec![]).await;
        harness.classify(Intent::DeleteBudget, Entities::default());

        let reply = harness.process("borrar presupuesto").await;

        assert!(reply.starts_with("⚠️ ¿Qué presupuesto quieres eliminar?"));
        assert!(harness.session().await.pending_confirmation.is_none());
    }

    #[tokio::test]
    async fn delete_by_year_in_name_targets_named_budget() {
        let harness = Harness::new();
        harness.budget("Casa", vec![]).await;
        harness
            .budget("Obra 2024", vec![LineItem::new("cemento", 2.0, 1000)])
            .await;
        harness.classify(Intent::DeleteBudget, named("2024"));

        let reply = harness.process("borrar 2024").await;

        assert!(reply.starts_with("⚠️ ¿Seguro que quieres eliminar \"Obra 2024\"?"));
        let pending = harness.session().await.pending_confirmation;
        assert_eq!(pending.map(|p| p.target).as_deref(), Some("Obra 2024"));
    }

    #[tokio::test]
    async fn delete_unknown_budget_reports_not_found() {
        let harness = Harness::new();
        harness.budget("Casa", vec![]).await;
        harness.classify(Intent::DeleteBudget, named("oficina"));

        let reply = harness.process("borrar oficina").await;

        assert_eq!(
            reply,
            replies::budget_not_found("oficina", &["Casa".to_string()], None)
        );
        assert!(harness.session().await.pending_confirmation.is_none());
    }

    #[tokio::test]
    async fn failed_delete_keeps_confirmation_pending() {
        let harness = Harness::new();
        harness.budget("X", vec![]).await;
        harness.classify(Intent::DeleteBudget, named("X"));
        harness.classify(Intent::ConfirmDelete, Entities::default());

        harness.process("borrar X").await;
        harness.ledger.fail_all();
        let reply = harness.process("sí").await;

        assert!(reply.starts_with("❌ No pude eliminar el presupuesto."));
        assert!(harness.session().await.pending_confirmation.is_some());
    }

    #[tokio::test]
    async fn no_budgets_to_delete() {
        let harness = Harness::new();
        harness.classify(Intent::DeleteBudget, Entities::default());

        let reply = harness.process("borrar").await;

        assert_eq!(reply, replies::NO_BUDGETS_TO_DELETE);
    }
}
