//! Budget document rendering.

use crate::error::RenderError;
use crate::item::{BudgetSummary, LineItem};
use crate::money::{format_clp, format_quantity};
use crate::store::LedgerStore;
use async_trait::async_trait;
use chrono::Utc;
use std::fmt::Write as _;
use std::sync::Arc;
use tracing::{info, instrument};

/// A rendered budget ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDocument {
    /// Document contents.
    pub bytes: Vec<u8>,
    /// MIME type of the contents.
    pub mime_type: String,
    /// File extension without the dot.
    pub extension: String,
}

/// Who a budget is prepared for, printed above the items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientDetails {
    pub name: String,
    pub phone: String,
    /// First notification address on file, if any.
    pub email: Option<String>,
}

/// Produces a shareable document for a budget.
#[async_trait]
pub trait DocumentRenderer: Send + Sync {
    /// Renders a budget, with a client block when `client` is known.
    ///
    /// Fails with [`RenderError::EmptyBudget`] if the budget has no items.
    async fn render(
        &self,
        ledger: &str,
        budget: &str,
        client: Option<&ClientDetails>,
    ) -> Result<RenderedDocument, RenderError>;
}

/// Builds the file name a document is sent under: `Presupuesto_Casa_Ashly.txt`.
#[must_use]
pub fn document_filename(budget: &str, extension: &str) -> String {
    let stem: String = budget
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_");
    format!("Presupuesto_{stem}.{extension}")
}

/// Renders an itemized plain-text document.
pub struct PlainTextRenderer {
    ledger: Arc<dyn LedgerStore>,
}

impl PlainTextRenderer {
    /// Creates a renderer reading from a ledger store.
    #[must_use]
    pub fn new(ledger: Arc<dyn LedgerStore>) -> Self {
        Self { ledger }
    }
}

#[async_trait]
impl DocumentRenderer for PlainTextRenderer {
    #[instrument(skip(self, client))]
    async fn render(
        &self,
        ledger: &str,
        budget: &str,
        client: Option<&ClientDetails>,
    ) -> Result<RenderedDocument, RenderError> {
        let items = self.ledger.get_items(ledger, budget).await?;
        if items.is_empty() {
            return Err(RenderError::EmptyBudget {
                name: budget.to_string(),
            });
        }

        let text = render_text(budget, client, &items);
        info!(items = items.len(), bytes = text.len(), "rendered budget document");
        Ok(RenderedDocument {
            bytes: text.into_bytes(),
            mime_type: "text/plain".to_string(),
            extension: "txt".to_string(),
        })
    }
}

fn render_text(budget: &str, client: Option<&ClientDetails>, items: &[LineItem]) -> String {
    let summary = BudgetSummary::from_items(items);
    let mut out = String::new();

    let _ = writeln!(out, "PRESUPUESTO: {budget}");
    let _ = writeln!(out, "Fecha: {}", Utc::now().format("%d-%m-%Y"));
    let _ = writeln!(out);
    if let Some(client) = client {
        let _ = writeln!(out, "Cliente: {}", client.name);
        let _ = writeln!(out, "Teléfono: {}", client.phone);
        if let Some(email) = &client.email {
            let _ = writeln!(out, "Email: {email}");
        }
        let _ = writeln!(out);
    }
    for (i, item) in items.iter().enumerate() {
        let _ = writeln!(
            out,
            "{}. {} | {} x {} = {}",
            i + 1,
            item.name,
            format_quantity(item.quantity),
            format_clp(item.unit_price as f64),
            format_clp(item.subtotal)
        );
        if let Some(note) = item.note.as_deref().filter(|n| !n.is_empty()) {
            let _ = writeln!(out, "   Nota: {note}");
        }
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "Ítems: {}", summary.count);
    let _ = writeln!(out, "TOTAL: {}", format_clp(summary.total));
    out
}
