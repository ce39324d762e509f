//! Line item handlers: add, view, total and delete.

use super::{HandlerResult, TurnState};
use crate::error::DialogError;
use crate::orchestrator::Orchestrator;
use crate::replies;
use budget_chat_ai::{Entities, OneOrMany};
use budget_chat_ledger::{BudgetSummary, LedgerError, LineItem};
use budget_chat_pricing::PriceSource;
use rootcause::prelude::Report;
use std::ops::ControlFlow;
use tracing::{error, info, instrument, warn};

/// One item to add, after entity normalization.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ItemRequest {
    pub name: String,
    pub quantity: f64,
    /// `None` means the price must be looked up.
    pub unit_price: Option<u64>,
}

fn usable(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

/// Lines up item names with their quantities and prices.
///
/// A quantity list shorter than the item list, or a scalar quantity, falls
/// back to the first usable quantity. A scalar price applies to the first
/// item only. Blank names and items without any usable quantity are dropped.
pub(crate) fn normalize_items(entities: &Entities) -> Vec<ItemRequest> {
    let names = entities
        .item
        .clone()
        .map(OneOrMany::into_vec)
        .unwrap_or_default();
    let quantities = entities
        .quantity
        .clone()
        .map(OneOrMany::into_vec)
        .unwrap_or_default();
    let prices = entities
        .unit_price
        .clone()
        .map(OneOrMany::into_vec)
        .unwrap_or_default();
    let fallback_quantity = quantities.iter().copied().find(|q| usable(*q));

    names
        .into_iter()
        .enumerate()
        .filter_map(|(i, name)| {
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            let quantity = quantities
                .get(i)
                .copied()
                .filter(|q| usable(*q))
                .or(fallback_quantity)?;
            let unit_price = prices
                .get(i)
                .copied()
                .flatten()
                .filter(|p| usable(*p))
                .map(|p| p.round() as u64)
                .filter(|p| *p > 0);
            Some(ItemRequest {
                name: name.to_string(),
                quantity,
                unit_price,
            })
        })
        .collect()
}

fn describe<T: ToString>(values: &Option<OneOrMany<T>>) -> Option<String> {
    let values = values.as_ref()?;
    let joined = match values {
        OneOrMany::One(value) => value.to_string(),
        OneOrMany::Many(values) => values
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", "),
    };
    Some(joined)
}

impl Orchestrator {
    /// Adds one or more items to a budget.
    ///
    /// Items are persisted one at a time in input order. A failure stops the
    /// loop; items already written stay in the budget.
    #[instrument(skip_all, fields(user = %state.user))]
    pub(crate) async fn add_items(
        &self,
        state: &TurnState<'_>,
        entities: &Entities,
    ) -> HandlerResult {
        let Some(ledger) = self.known_ledger(state).await? else {
            return Ok(replies::NO_BUDGETS_YET.to_string());
        };

        let active = match self.budget_for_items(state, &ledger, entities).await? {
            ControlFlow::Continue(active) => active,
            ControlFlow::Break(reply) => return Ok(reply),
        };

        if !entities.has_item() || !entities.has_quantity() {
            let items = entities.has_item().then(|| describe(&entities.item)).flatten();
            let quantities = entities
                .has_quantity()
                .then(|| describe(&entities.quantity))
                .flatten();
            return Ok(replies::missing_item_details(
                &active,
                items.as_deref(),
                quantities.as_deref(),
            ));
        }

        let requests = normalize_items(entities);
        if requests.iter().any(|r| r.unit_price.is_none()) {
            self.notify(state, replies::PRICE_LOOKUP_NOTICE).await;
        }

        let total = requests.len();
        let mut added: Vec<(LineItem, Option<PriceSource>)> = Vec::with_capacity(total);
        for request in requests {
            let (price, source) = match request.unit_price {
                Some(price) => (price, None),
                None => {
                    let quote = self.prices.get_price(&request.name).await;
                    (quote.price, Some(quote.source))
                }
            };
            let item = LineItem::new(request.name, request.quantity, price);

            match self.ledger.add_item(&ledger, &active, &item).await {
                Ok(()) => added.push((item, source)),
                Err(LedgerError::BudgetNotFound { .. }) if added.is_empty() => {
                    return self.budget_vanished(state, &ledger, &active).await;
                }
                Err(e) => {
                    error!(
                        budget = %active,
                        committed = added.len(),
                        total,
                        error = %e,
                        "item ingestion stopped"
                    );
                    return Err(DialogError::from(e).into());
                }
            }
        }

        info!(budget = %active, count = added.len(), "added items");
        Ok(replies::items_added(&active, &added))
    }

    /// Works out which budget new items go to, activating it if needed.
    async fn budget_for_items(
        &self,
        state: &TurnState<'_>,
        ledger: &str,
        entities: &Entities,
    ) -> Result<ControlFlow<String, String>, Report<DialogError>> {
        if let Some(query) = entities.budget_name() {
            let budgets = self.list_budget_names(ledger).await?;
            return Ok(match self.find_budget(query, &budgets) {
                Some(budget) => {
                    if !state.session.is_active(budget) {
                        self.set_active(state, Some(budget)).await?;
                    }
                    ControlFlow::Continue(budget.to_string())
                }
                None => ControlFlow::Break(replies::budget_not_found(
                    query,
                    &budgets,
                    state.active_budget(),
                )),
            });
        }

        if let Some(active) = state.active_budget() {
            return Ok(ControlFlow::Continue(active.to_string()));
        }

        let budgets = self.list_budget_names(ledger).await?;
        Ok(match budgets.as_slice() {
            [] => ControlFlow::Break(replies::NO_BUDGETS_OFFER.to_string()),
            [only] => {
                self.set_active(state, Some(only.as_str())).await?;
                info!(budget = %only, "auto-activated only budget");
                ControlFlow::Continue(only.clone())
            }
            _ => ControlFlow::Break(replies::pick_budget_for_items(&budgets)),
        })
    }

    /// Sends a progress notice. Delivery failures are logged and ignored.
    pub(crate) async fn notify(&self, state: &TurnState<'_>, text: &str) {
        if let Err(e) = self.gateway.send_text(state.user, text).await {
            warn!(error = %e, "progress notice not delivered");
        }
    }

    #[instrument(skip_all, fields(user = %state.user))]
    pub(crate) async fn view_items(&self, state: &TurnState<'_>) -> HandlerResult {
        let (ledger, active) = match self.focused_budget(state).await? {
            ControlFlow::Continue(focus) => focus,
            ControlFlow::Break(reply) => return Ok(reply),
        };
        let items = match self.ledger.get_items(&ledger, &active).await {
            Ok(items) => items,
            Err(LedgerError::BudgetNotFound { .. }) => {
                return self.budget_vanished(state, &ledger, &active).await;
            }
            Err(e) => return Err(DialogError::from(e).into()),
        };

        if items.is_empty() {
            return Ok(replies::empty_budget(&active));
        }
        Ok(replies::item_list(&active, &items))
    }

    #[instrument(skip_all, fields(user = %state.user))]
    pub(crate) async fn view_total(&self, state: &TurnState<'_>) -> HandlerResult {
        let (ledger, active) = match self.focused_budget(state).await? {
            ControlFlow::Continue(focus) => focus,
            ControlFlow::Break(reply) => return Ok(reply),
        };
        let items = match self.ledger.get_items(&ledger, &active).await {
            Ok(items) => items,
            Err(LedgerError::BudgetNotFound { .. }) => {
                return self.budget_vanished(state, &ledger, &active).await;
            }
            Err(e) => return Err(DialogError::from(e).into()),
        };

        let summary = BudgetSummary::from_items(&items);
        Ok(replies::total_overview(&active, &summary))
    }

    /// Deletes the item at the selected position, or lists the items so the
    /// user can pick one.
    #[instrument(skip_all, fields(user = %state.user))]
    pub(crate) async fn delete_item(
        &self,
        state: &TurnState<'_>,
        entities: &Entities,
    ) -> HandlerResult {
        let (ledger, active) = match self.focused_budget(state).await? {
            ControlFlow::Continue(focus) => focus,
            ControlFlow::Break(reply) => return Ok(reply),
        };
        let items = match self.ledger.get_items(&ledger, &active).await {
            Ok(items) => items,
            Err(LedgerError::BudgetNotFound { .. }) => {
                return self.budget_vanished(state, &ledger, &active).await;
            }
            Err(e) => return Err(DialogError::from(e).into()),
        };
        if items.is_empty() {
            return Ok(replies::nothing_to_delete(&active));
        }

        let position = entities
            .selection_index
            .and_then(|index| usize::try_from(index).ok())
            .filter(|position| (1..=items.len()).contains(position));
        let Some(position) = position else {
            return Ok(replies::pick_item_to_delete(&active, &items));
        };

        match self.ledger.delete_item(&ledger, &active, position).await {
            Ok(removed) => {
                info!(budget = %active, position, item = %removed.name, "deleted item");
                Ok(replies::item_deleted(&active, &removed))
            }
            Err(LedgerError::PositionOutOfRange { .. }) => {
                Ok(replies::pick_item_to_delete(&active, &items))
            }
            Err(LedgerError::BudgetNotFound { .. }) => {
                self.budget_vanished(state, &ledger, &active).await
            }
            Err(e) => Err(DialogError::from(e).into()),
        }
    }
}
