//! In-memory ledger.

use crate::error::LedgerError;
use crate::item::LineItem;
use crate::store::{LedgerStore, RESERVED_SHEET, same_budget_name};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;

#[derive(Debug)]
struct Sheet {
    name: String,
    items: Vec<LineItem>,
}

#[derive(Debug)]
struct Ledger {
    sheets: Vec<Sheet>,
}

impl Ledger {
    fn new() -> Self {
        Self {
            sheets: vec![Sheet {
                name: RESERVED_SHEET.to_string(),
                items: Vec::new(),
            }],
        }
    }

    fn budget_mut(&mut self, name: &str) -> Result<&mut Sheet, LedgerError> {
        self.sheets
            .iter_mut()
            .filter(|s| s.name != RESERVED_SHEET)
            .find(|s| same_budget_name(&s.name, name))
            .ok_or_else(|| LedgerError::BudgetNotFound {
                name: name.to_string(),
            })
    }
}

/// Keeps ledgers in process memory.
///
/// A ledger springs into existence, holding only the reserved sheet, the
/// first time its handle is used.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    ledgers: Mutex<HashMap<String, Ledger>>,
}

impl InMemoryLedger {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a budget with items.
    #[must_use]
    pub fn with_budget(self, ledger: &str, name: &str, items: Vec<LineItem>) -> Self {
        self.with_ledger(ledger, |l| {
            l.sheets.push(Sheet {
                name: name.to_string(),
                items,
            });
        });
        self
    }

    fn ledgers(&self) -> MutexGuard<'_, HashMap<String, Ledger>> {
        self.ledgers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn with_ledger<T>(&self, handle: &str, f: impl FnOnce(&mut Ledger) -> T) -> T {
        let mut ledgers = self.ledgers();
        f(ledgers
            .entry(handle.to_string())
            .or_insert_with(Ledger::new))
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedger {
    async fn create_budget(&self, ledger: &str, name: &str) -> Result<(), LedgerError> {
        self.with_ledger(ledger, |l| {
            if l.sheets.iter().any(|s| same_budget_name(&s.name, name)) {
                return Err(LedgerError::NameCollision {
                    name: name.to_string(),
                });
            }
            l.sheets.push(Sheet {
                name: name.to_string(),
                items: Vec::new(),
            });
            debug!(ledger, budget = name, "created budget");
            Ok(())
        })
    }

    async fn list_budgets(&self, ledger: &str) -> Result<Vec<String>, LedgerError> {
        Ok(self.with_ledger(ledger, |l| {
            l.sheets
                .iter()
                .filter(|s| s.name != RESERVED_SHEET)
                .map(|s| s.name.clone())
                .collect()
        }))
    }

    async fn add_item(
        &self,
        ledger: &str,
        budget: &str,
        item: &LineItem,
    ) -> Result<(), LedgerError> {
        self.with_ledger(ledger, |l| {
            l.budget_mut(budget)?.items.push(item.clone());
            Ok(())
        })
    }

    async fn get_items(&self, ledger: &str, budget: &str) -> Result<Vec<LineItem>, LedgerError> {
        self.with_ledger(ledger, |l| Ok(l.budget_mut(budget)?.items.clone()))
    }

    async fn delete_item(
        &self,
        ledger: &str,
        budget: &str,
        position: usize,
    ) -> Result<LineItem, LedgerError> {
        self.with_ledger(ledger, |l| {
            let sheet = l.budget_mut(budget)?;
            let len = sheet.items.len();
            if position == 0 || position > len {
                return Err(LedgerError::PositionOutOfRange { position, len });
            }
            Ok(sheet.items.remove(position - 1))
        })
    }

    async fn delete_budget(&self, ledger: &str, budget: &str) -> Result<(), LedgerError> {
        self.with_ledger(ledger, |l| {
            let index = l
                .sheets
                .iter()
                .position(|s| s.name != RESERVED_SHEET && same_budget_name(&s.name, budget))
                .ok_or_else(|| LedgerError::BudgetNotFound {
                    name: budget.to_string(),
                })?;
            l.sheets.remove(index);
            debug!(ledger, budget, "deleted budget");
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LEDGER: &str = "sheet-1";

    #[tokio::test]
    async fn create_then_list() {
        let store = InMemoryLedger::new();
        store.create_budget(LEDGER, "Casa Ashly").await.unwrap();
        store.create_budget(LEDGER, "Obra Norte").await.unwrap();

        let budgets = store.list_budgets(LEDGER).await.unwrap();
        assert_eq!(budgets, ["Casa Ashly", "Obra Norte"]);
    }

    #[tokio::test]
    async fn reserved_sheet_is_hidden_and_taken() {
        let store = InMemoryLedger::new();
        assert!(store.list_budgets(LEDGER).await.unwrap().is_empty());

        let err = store.create_budget(LEDGER, "información").await.unwrap_err();
        assert!(matches!(err, LedgerError::NameCollision { .. }));
    }

    #[tokio::test]
    async fn duplicate_names_collide() {
        let store = InMemoryLedger::new();
        store.create_budget(LEDGER, "Casa").await.unwrap();
        let err = store.create_budget(LEDGER, "CASA").await.unwrap_err();
        assert_eq!(
            err,
            LedgerError::NameCollision {
                name: "CASA".to_string()
            }
        );
    }

    #[tokio::test]
    async fn ledgers_are_isolated() {
        let store = InMemoryLedger::new();
        store.create_budget("a", "Casa").await.unwrap();
        store.create_budget("b", "Casa").await.unwrap();
        assert_eq!(store.list_budgets("a").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn items_keep_insertion_order() {
        let store = InMemoryLedger::new();
        store.create_budget(LEDGER, "Casa").await.unwrap();
        for name in ["cemento", "clavos", "arena"] {
            store
                .add_item(LEDGER, "Casa", &LineItem::new(name, 1.0, 1000))
                .await
                .unwrap();
        }

        let items = store.get_items(LEDGER, "casa").await.unwrap();
        let names: Vec<_> = items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, ["cemento", "clavos", "arena"]);
    }

    #[tokio::test]
    async fn deleting_shifts_later_positions() {
        let store = InMemoryLedger::new().with_budget(
            LEDGER,
            "Casa",
            vec![
                LineItem::new("uno", 1.0, 100),
                LineItem::new("dos", 1.0, 200),
                LineItem::new("tres", 1.0, 300),
            ],
        );

        let removed = store.delete_item(LEDGER, "Casa", 2).await.unwrap();
        assert_eq!(removed.name, "dos");

        let items = store.get_items(LEDGER, "Casa").await.unwrap();
        assert_eq!(items[1].name, "tres");
    }

    #[tokio::test]
    async fn delete_item_out_of_range() {
        let store = InMemoryLedger::new().with_budget(
            LEDGER,
            "Casa",
            vec![LineItem::new("uno", 1.0, 100)],
        );

        for position in [0, 2] {
            let err = store.delete_item(LEDGER, "Casa", position).await.unwrap_err();
            assert_eq!(err, LedgerError::PositionOutOfRange { position, len: 1 });
        }
    }

    #[tokio::test]
    async fn missing_budget_is_reported() {
        let store = InMemoryLedger::new();
        let err = store.get_items(LEDGER, "Nada").await.unwrap_err();
        assert!(matches!(err, LedgerError::BudgetNotFound { .. }));

        let err = store
            .add_item(LEDGER, "Nada", &LineItem::new("x", 1.0, 1))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::BudgetNotFound { .. }));
    }

    #[tokio::test]
    async fn delete_budget_removes_it() {
        let store = InMemoryLedger::new();
        store.create_budget(LEDGER, "Casa").await.unwrap();
        store.create_budget(LEDGER, "Obra").await.unwrap();

        store.delete_budget(LEDGER, "Casa").await.unwrap();
        assert_eq!(store.list_budgets(LEDGER).await.unwrap(), ["Obra"]);

        let err = store.delete_budget(LEDGER, RESERVED_SHEET).await.unwrap_err();
        assert!(matches!(err, LedgerError::BudgetNotFound { .. }));
    }
}
