//! Ledger storage contract.

use crate::error::LedgerError;
use crate::item::LineItem;
use async_trait::async_trait;

/// Sheet every ledger carries for account details. Never listed as a budget.
pub const RESERVED_SHEET: &str = "Información";

/// Stores budgets and their line items.
///
/// Every operation is a single call with per-call atomicity; there is no
/// batch or transaction primitive.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Creates an empty budget.
    ///
    /// Fails with [`LedgerError::NameCollision`] if the name is taken,
    /// compared case-insensitively.
    async fn create_budget(&self, ledger: &str, name: &str) -> Result<(), LedgerError>;

    /// Lists budget names in ledger order, without the reserved sheet.
    async fn list_budgets(&self, ledger: &str) -> Result<Vec<String>, LedgerError>;

    /// Appends an item to a budget.
    async fn add_item(&self, ledger: &str, budget: &str, item: &LineItem)
    -> Result<(), LedgerError>;

    /// Returns a budget's items in order.
    async fn get_items(&self, ledger: &str, budget: &str) -> Result<Vec<LineItem>, LedgerError>;

    /// Removes the item at a 1-based position, returning it.
    async fn delete_item(
        &self,
        ledger: &str,
        budget: &str,
        position: usize,
    ) -> Result<LineItem, LedgerError>;

    /// Removes a budget and all its items.
    async fn delete_budget(&self, ledger: &str, budget: &str) -> Result<(), LedgerError>;
}

/// Compares budget names the way the ledger does.
#[must_use]
pub fn same_budget_name(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn budget_names_compare_case_insensitively() {
        assert!(same_budget_name("Casa Ashly", "casa ashly "));
        assert!(same_budget_name("INFORMACIÓN", RESERVED_SHEET));
        assert!(!same_budget_name("Casa", "Casa 2"));
    }
}
