//! Line items and budget summaries.

use serde::{Deserialize, Serialize};

/// One priced row of a budget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    /// Item name.
    pub name: String,
    /// Quantity; may be fractional (meters, kilos).
    pub quantity: f64,
    /// Unit price in whole pesos.
    pub unit_price: u64,
    /// `quantity * unit_price`.
    pub subtotal: f64,
    /// Free-form note.
    pub note: Option<String>,
}

impl LineItem {
    /// Creates an item, computing its subtotal.
    #[must_use]
    pub fn new(name: impl Into<String>, quantity: f64, unit_price: u64) -> Self {
        Self {
            name: name.into(),
            quantity,
            unit_price,
            subtotal: quantity * unit_price as f64,
            note: None,
        }
    }

    /// Attaches a note.
    #[must_use]
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// Aggregate figures for one budget.
#[derive(Debug, Clone, PartialEq)]
pub struct BudgetSummary {
    /// Sum of all subtotals.
    pub total: f64,
    /// Number of items.
    pub count: usize,
    /// Item with the largest subtotal.
    pub most_expensive: Option<LineItem>,
    /// Item with the smallest subtotal.
    pub least_expensive: Option<LineItem>,
    /// Mean subtotal; zero for an empty budget.
    pub mean: f64,
}

impl BudgetSummary {
    /// Summarizes a list of items. Ties keep the earliest item.
    #[must_use]
    pub fn from_items(items: &[LineItem]) -> Self {
        let total: f64 = items.iter().map(|i| i.subtotal).sum();
        let count = items.len();

        let mut most: Option<&LineItem> = None;
        let mut least: Option<&LineItem> = None;
        for item in items {
            if most.is_none_or(|m| item.subtotal > m.subtotal) {
                most = Some(item);
            }
            if least.is_none_or(|l| item.subtotal < l.subtotal) {
                least = Some(item);
            }
        }

        let mean = if count == 0 { 0.0 } else { total / count as f64 };

        Self {
            total,
            count,
            most_expensive: most.cloned(),
            least_expensive: least.cloned(),
            mean,
        }
    }

    /// Returns true if the budget has no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subtotal_is_quantity_times_price() {
        let item = LineItem::new("cemento", 10.0, 8500);
        assert!((item.subtotal - 85_000.0).abs() < f64::EPSILON);

        let item = LineItem::new("cable", 2.5, 1200);
        assert!((item.subtotal - 3000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn summary_of_two_items() {
        let items = vec![LineItem::new("a", 1.0, 1000), LineItem::new("b", 1.0, 3000)];
        let summary = BudgetSummary::from_items(&items);

        assert!((summary.total - 4000.0).abs() < f64::EPSILON);
        assert_eq!(summary.count, 2);
        assert_eq!(summary.most_expensive.map(|i| i.name), Some("b".to_string()));
        assert_eq!(summary.least_expensive.map(|i| i.name), Some("a".to_string()));
        assert!((summary.mean - 2000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn summary_of_empty_budget() {
        let summary = BudgetSummary::from_items(&[]);
        assert!(summary.is_empty());
        assert!(summary.total.abs() < f64::EPSILON);
        assert!(summary.mean.abs() < f64::EPSILON);
        assert!(summary.most_expensive.is_none());
        assert!(summary.least_expensive.is_none());
    }

    #[test]
    fn ties_keep_first_item() {
        let items = vec![LineItem::new("a", 1.0, 500), LineItem::new("b", 1.0, 500)];
        let summary = BudgetSummary::from_items(&items);
        assert_eq!(summary.most_expensive.map(|i| i.name), Some("a".to_string()));
        assert_eq!(summary.least_expensive.map(|i| i.name), Some("a".to_string()));
    }
}
