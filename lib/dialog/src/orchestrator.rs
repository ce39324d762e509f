//! The turn pipeline.

use crate::config::DialogConfig;
use crate::error::DialogError;
use crate::gateway::MessageGateway;
use crate::handlers::TurnState;
use crate::matcher::{BudgetMatcher, SubstringMatcher};
use crate::replies::{self, GENERIC_FAILURE};
use budget_chat_accounts::AccountDirectory;
use budget_chat_ai::{ClassifierContext, Entities, Intent, IntentClassifier, LlmMessage};
use budget_chat_conversation::{Session, SessionStore, Turn};
use budget_chat_core::UserId;
use budget_chat_ledger::{DocumentRenderer, LedgerStore};
use budget_chat_pricing::PriceResolver;
use rootcause::prelude::Report;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

/// The collaborators an [`Orchestrator`] works against.
#[derive(Clone)]
pub struct Collaborators {
    pub classifier: Arc<dyn IntentClassifier>,
    pub sessions: Arc<dyn SessionStore>,
    pub ledger: Arc<dyn LedgerStore>,
    pub prices: Arc<PriceResolver>,
    pub directory: Arc<dyn AccountDirectory>,
    pub gateway: Arc<dyn MessageGateway>,
    pub renderer: Arc<dyn DocumentRenderer>,
}

/// Turns inbound utterances into replies.
///
/// Holds no per-user state; everything that must survive between messages
/// lives in the session store.
pub struct Orchestrator {
    pub(crate) classifier: Arc<dyn IntentClassifier>,
    pub(crate) sessions: Arc<dyn SessionStore>,
    pub(crate) ledger: Arc<dyn LedgerStore>,
    pub(crate) prices: Arc<PriceResolver>,
    pub(crate) directory: Arc<dyn AccountDirectory>,
    pub(crate) gateway: Arc<dyn MessageGateway>,
    pub(crate) renderer: Arc<dyn DocumentRenderer>,
    pub(crate) matcher: Arc<dyn BudgetMatcher>,
    pub(crate) config: DialogConfig,
}

impl Orchestrator {
    /// Creates an orchestrator using [`SubstringMatcher`] for budget names.
    #[must_use]
    pub fn new(collaborators: Collaborators, config: DialogConfig) -> Self {
        let Collaborators {
            classifier,
            sessions,
            ledger,
            prices,
            directory,
            gateway,
            renderer,
        } = collaborators;

        Self {
            classifier,
            sessions,
            ledger,
            prices,
            directory,
            gateway,
            renderer,
            matcher: Arc::new(SubstringMatcher),
            config,
        }
    }

    /// Replaces the budget name matching strategy.
    #[must_use]
    pub fn with_matcher(mut self, matcher: Arc<dyn BudgetMatcher>) -> Self {
        self.matcher = matcher;
        self
    }

    /// Handles one inbound utterance and returns the reply sent to the user.
    ///
    /// Never fails. If the pipeline itself breaks, the user gets
    /// [`GENERIC_FAILURE`] and delivery of that message is still attempted.
    #[instrument(skip(self, text), fields(user = %user))]
    pub async fn process(&self, user: &UserId, text: &str) -> String {
        match self.run_turn(user, text).await {
            Ok(reply) => reply,
            Err(report) => {
                error!(error = %report, "turn pipeline failed");
                if let Err(e) = self.gateway.send_text(user, GENERIC_FAILURE).await {
                    warn!(error = %e, "failed to deliver failure notice");
                }
                GENERIC_FAILURE.to_string()
            }
        }
    }

    async fn run_turn(&self, user: &UserId, text: &str) -> Result<String, Report<DialogError>> {
        self.sessions
            .append_turn(user, Turn::user(text))
            .await
            .map_err(DialogError::from)?;

        let mut session = self
            .sessions
            .get_or_create(user)
            .await
            .map_err(DialogError::from)?;

        if session.has_expired_confirmation() {
            debug!(turn = session.user_turns, "pending confirmation expired");
            self.sessions
                .set_pending_confirmation(user, None)
                .await
                .map_err(DialogError::from)?;
            session.pending_confirmation = None;
        }

        let context = self.classifier_context(user, &session).await?;
        let utterance = self.classifier.classify(text, &context).await;
        let intent = if utterance.confidence < self.config.min_confidence {
            Intent::Unknown
        } else {
            utterance.intent
        };
        info!(
            intent = %intent,
            confidence = utterance.confidence,
            needs_context = utterance.needs_context,
            "classified turn"
        );

        let state = TurnState {
            user,
            session: &session,
        };
        let reply = match self.dispatch(&state, intent, &utterance.entities).await {
            Ok(reply) => reply,
            Err(report) => {
                error!(intent = %intent, error = %report, "handler failed");
                replies::apology(failed_action(intent))
            }
        };

        let entities = serde_json::to_value(&utterance.entities).unwrap_or_default();
        self.sessions
            .append_turn(
                user,
                Turn::agent(reply.as_str()).with_classification(intent.as_str(), entities),
            )
            .await
            .map_err(DialogError::from)?;

        self.gateway
            .send_text(user, &reply)
            .await
            .map_err(DialogError::from)?;

        self.spawn_trim(user);
        Ok(reply)
    }

    async fn classifier_context(
        &self,
        user: &UserId,
        session: &Session,
    ) -> Result<ClassifierContext, Report<DialogError>> {
        let mut turns = self
            .sessions
            .recent_turns(user, self.config.context_turns + 1)
            .await
            .map_err(DialogError::from)?;
        // The newest turn is the utterance being classified.
        turns.pop();

        let recent = turns
            .into_iter()
            .map(|turn| {
                if turn.is_user() {
                    LlmMessage::user(turn.text)
                } else {
                    LlmMessage::assistant(turn.text)
                }
            })
            .collect();

        Ok(ClassifierContext {
            active_budget: session.active_budget.clone(),
            recent,
        })
    }

    async fn dispatch(
        &self,
        state: &TurnState<'_>,
        intent: Intent,
        entities: &Entities,
    ) -> Result<String, Report<DialogError>> {
        let active = state.active_budget();
        match intent {
            Intent::Greeting => Ok(replies::greeting(active)),
            Intent::GeneralQuery => Ok(replies::general_help(active)),
            Intent::Unknown => Ok(replies::not_understood(active)),
            Intent::EditItem => Ok(replies::EDIT_NOT_AVAILABLE.to_string()),
            Intent::CreateBudget => self.create_budget(state, entities).await,
            Intent::AddItem => self.add_items(state, entities).await,
            Intent::ViewItems => self.view_items(state).await,
            Intent::ViewTotal => self.view_total(state).await,
            Intent::DeleteItem => self.delete_item(state, entities).await,
            Intent::DeleteBudget => self.request_budget_deletion(state, entities).await,
            Intent::ConfirmDelete => self.confirm_budget_deletion(state).await,
            Intent::CancelPending => self.cancel_pending(state).await,
            Intent::ListBudgets => self.list_budgets(state).await,
            Intent::ChangeBudget => self.change_budget(state, entities).await,
            Intent::DownloadBudget => self.download_budget(state).await,
        }
    }

    fn spawn_trim(&self, user: &UserId) {
        let sessions = Arc::clone(&self.sessions);
        let user = user.clone();
        let keep = self.config.history_keep;
        tokio::spawn(async move {
            match sessions.trim_history(&user, keep).await {
                Ok(0) => {}
                Ok(removed) => debug!(user = %user, removed, "trimmed history"),
                Err(e) => warn!(user = %user, error = %e, "history trimming failed"),
            }
        });
    }
}

fn failed_action(intent: Intent) -> &'static str {
    match intent {
        Intent::CreateBudget => "crear el presupuesto",
        Intent::AddItem => "agregar los items",
        Intent::ViewItems => "obtener los items",
        Intent::ViewTotal => "calcular el total",
        Intent::DeleteItem => "eliminar el item",
        Intent::DeleteBudget | Intent::ConfirmDelete => "eliminar el presupuesto",
        Intent::ListBudgets => "obtener tus presupuestos",
        Intent::ChangeBudget => "cambiar de presupuesto",
        Intent::DownloadBudget => "generar el documento",
        _ => "completar la acción",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{Harness, classified};
    use budget_chat_conversation::TurnRole;
    use budget_chat_ledger::LineItem;

    #[tokio::test]
    async fn records_turns_and_sends_reply_in_order() {
        let harness = Harness::new();
        harness.classify(Intent::Greeting, Entities::default());

        let reply = harness.process("hola").await;

        assert!(reply.starts_with("¡Hola!"));
        let turns = harness.turns().await;
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].role, TurnRole::User);
        assert_eq!(turns[0].text, "hola");
        assert_eq!(turns[1].role, TurnRole::Agent);
        assert_eq!(turns[1].text, reply);
        assert_eq!(turns[1].intent.as_deref(), Some("greeting"));
        assert_eq!(harness.gateway.texts(), vec![reply]);
    }

    #[tokio::test]
    async fn classifier_sees_earlier_turns_and_active_budget() {
        let harness = Harness::new();
        harness.activate("Casa").await;
        harness.classify(Intent::Greeting, Entities::default());
        harness.classify(Intent::ViewTotal, Entities::default());

        harness.process("hola").await;
        harness.process("cuánto llevo").await;

        let contexts = harness.classifier.contexts();
        assert_eq!(contexts.len(), 2);
        assert!(contexts[0].recent.is_empty());
        assert_eq!(contexts[1].recent.len(), 2);
        assert_eq!(contexts[1].recent[0].content, "hola");
        assert_eq!(contexts[1].active_budget.as_deref(), Some("Casa"));
    }

    #[tokio::test]
    async fn low_confidence_is_treated_as_unknown() {
        let harness = Harness::new();
        harness.budget("Casa", vec![]).await;
        harness.activate("Casa").await;
        let mut utterance = classified(Intent::DeleteBudget, crate::test_support::named("Casa"));
        utterance.confidence = 0.1;
        harness.classifier.push(utterance);

        let reply = harness.process("eh").await;

        assert!(reply.starts_with("📊 Presupuesto: \"Casa\""));
        assert!(reply.contains("🤔 No entendí."));
        assert!(harness.session().await.pending_confirmation.is_none());
    }

    #[tokio::test]
    async fn classifier_degradation_still_replies() {
        let harness = Harness::new();
        let reply = harness.process("???").await;
        assert!(reply.contains("🤔 No entendí."));
    }

    #[tokio::test]
    async fn broken_session_store_yields_generic_failure() {
        let harness = Harness::with_broken_sessions();
        harness.classify(Intent::Greeting, Entities::default());

        let reply = harness.process("hola").await;

        assert_eq!(reply, GENERIC_FAILURE);
        assert_eq!(harness.gateway.texts(), vec![GENERIC_FAILURE.to_string()]);
    }

    #[tokio::test]
    async fn ledger_failure_becomes_apology() {
        let harness = Harness::new();
        harness.budget("Casa", vec![]).await;
        harness.activate("Casa").await;
        harness.ledger.fail_all();
        harness.classify(Intent::ViewItems, Entities::default());

        let reply = harness.process("ver items").await;

        assert_eq!(
            reply,
            "❌ No pude obtener los items. Por favor, intenta de nuevo en un momento."
        );
        assert_eq!(harness.gateway.texts(), vec![reply]);
    }

    #[tokio::test]
    async fn history_is_trimmed_in_background() {
        let harness = Harness::with_config(DialogConfig {
            history_keep: 4,
            ..DialogConfig::default()
        });
        for _ in 0..5 {
            harness.classify(Intent::Greeting, Entities::default());
            harness.process("hola").await;
        }

        for _ in 0..10 {
            if harness.turns().await.len() <= 4 {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(harness.turns().await.len(), 4);
    }

    #[tokio::test]
    async fn edit_reports_feature_unavailable() {
        let harness = Harness::new();
        harness
            .budget("Casa", vec![LineItem::new("cemento", 1.0, 100)])
            .await;
        harness.activate("Casa").await;
        harness.classify(Intent::EditItem, Entities::default());

        let reply = harness.process("cambia el precio del cemento").await;

        assert_eq!(reply, replies::EDIT_NOT_AVAILABLE);
        assert_eq!(harness.items("Casa").await.len(), 1);
    }
}
