//! Budget document delivery.

use super::{HandlerResult, TurnState};
use crate::gateway::OutboundDocument;
use crate::orchestrator::Orchestrator;
use crate::replies;
use budget_chat_ledger::{ClientDetails, LedgerError, RenderError, document_filename};
use std::ops::ControlFlow;
use tracing::{info, instrument, warn};

impl Orchestrator {
    /// Renders the active budget and sends it as a document.
    ///
    /// Render and delivery failures produce a retry message, not an error.
    #[instrument(skip_all, fields(user = %state.user))]
    pub(crate) async fn download_budget(&self, state: &TurnState<'_>) -> HandlerResult {
        let (ledger, active) = match self.focused_budget(state).await? {
            ControlFlow::Continue(focus) => focus,
            ControlFlow::Break(reply) => return Ok(reply),
        };

        self.notify(state, replies::RENDER_NOTICE).await;

        let client = self.client_details(state);
        let rendered = match self
            .renderer
            .render(&ledger, &active, client.as_ref())
            .await
        {
            Ok(rendered) => rendered,
            Err(RenderError::EmptyBudget { .. }) => return Ok(replies::nothing_to_render(&active)),
            Err(RenderError::Ledger(LedgerError::BudgetNotFound { .. })) => {
                return self.budget_vanished(state, &ledger, &active).await;
            }
            Err(e) => {
                warn!(budget = %active, error = %e, "budget render failed");
                return Ok(replies::RENDER_RETRY.to_string());
            }
        };

        let document = OutboundDocument {
            filename: document_filename(&active, &rendered.extension),
            mime_type: rendered.mime_type,
            bytes: rendered.bytes,
        };
        let size = document.bytes.len();
        if let Err(e) = self.gateway.send_document(state.user, document).await {
            warn!(budget = %active, error = %e, "budget document not delivered");
            return Ok(replies::RENDER_RETRY.to_string());
        }

        info!(budget = %active, bytes = size, "sent budget document");
        Ok(replies::document_sent(&active))
    }

    fn client_details(&self, state: &TurnState<'_>) -> Option<ClientDetails> {
        self.directory
            .lookup(state.user.as_str())
            .map(|account| ClientDetails {
                name: account.display_name().to_string(),
                phone: account.phone().to_string(),
                email: account.notify_emails().first().cloned(),
            })
    }
}

#[cfg(test)]
mod tests {
    use crate::replies;
    use crate::test_support::Harness;
    use budget_chat_ai::{Entities, Intent};
    use budget_chat_ledger::LineItem;

    #[tokio::test]
    async fn sends_rendered_document() {
        let harness = Harness::new();
        harness
            .budget("Casa Ashly", vec![LineItem::new("cemento", 10.0, 8500)])
            .await;
        harness.activate("Casa Ashly").await;
        harness.classify(Intent::DownloadBudget, Entities::default());

        let reply = harness.process("descargar").await;

        assert_eq!(reply, replies::document_sent("Casa Ashly"));
        let documents = harness.gateway.documents();
        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0].filename, "Presupuesto_Casa_Ashly.txt");
        assert_eq!(documents[0].mime_type, "text/plain");
        let body = String::from_utf8_lossy(&documents[0].bytes);
        assert!(body.contains("cemento"));
        assert!(body.contains("Cliente: Constructora Ashly"));
        assert!(body.contains("Email: obras@ashly.cl"));
        assert_eq!(harness.gateway.texts()[0], replies::RENDER_NOTICE);
    }

    #[tokio::test]
    async fn empty_budget_is_not_rendered() {
        let harness = Harness::new();
        harness.budget("Casa", vec![]).await;
        harness.activate("Casa").await;
        harness.classify(Intent::DownloadBudget, Entities::default());

        let reply = harness.process("descargar").await;

        assert_eq!(reply, replies::nothing_to_render("Casa"));
        assert!(harness.gateway.documents().is_empty());
    }

    #[tokio::test]
    async fn delivery_failure_asks_to_retry() {
        let harness = Harness::new();
        harness
            .budget("Casa", vec![LineItem::new("cemento", 1.0, 100)])
            .await;
        harness.activate("Casa").await;
        harness.gateway.fail_documents();
        harness.classify(Intent::DownloadBudget, Entities::default());

        let reply = harness.process("descargar").await;

        assert_eq!(reply, replies::RENDER_RETRY);
    }

    #[tokio::test]
    async fn render_failure_hides_details() {
        let harness = Harness::new();
        harness
            .budget("Casa", vec![LineItem::new("cemento", 1.0, 100)])
            .await;
        harness.activate("Casa").await;
        harness.ledger.fail_all();
        harness.classify(Intent::DownloadBudget, Entities::default());

        let reply = harness.process("descargar").await;

        assert_eq!(reply, replies::RENDER_RETRY);
        assert!(harness.gateway.documents().is_empty());
    }
}
