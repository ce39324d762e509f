//! Budget name matching.
//!
//! Users rarely type a budget's full name, so requests are matched against
//! the ledger's budget list. The strategy is pluggable.

/// Finds the budget a user meant.
pub trait BudgetMatcher: Send + Sync {
    /// Returns the budget matching `query`, if any.
    fn find<'a>(&self, query: &str, budgets: &'a [String]) -> Option<&'a str>;
}

/// Case-insensitive containment; the first budget whose name contains the
/// query wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubstringMatcher;

impl BudgetMatcher for SubstringMatcher {
    fn find<'a>(&self, query: &str, budgets: &'a [String]) -> Option<&'a str> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return None;
        }
        budgets
            .iter()
            .find(|b| b.to_lowercase().contains(&query))
            .map(String::as_str)
    }
}

/// Exact, then prefix, then substring; each tier case-insensitive.
///
/// Stricter than [`SubstringMatcher`]: "casa" picks a budget named "Casa"
/// over an earlier "Mi casa de campo".
#[derive(Debug, Clone, Copy, Default)]
pub struct TieredMatcher;

impl BudgetMatcher for TieredMatcher {
    fn find<'a>(&self, query: &str, budgets: &'a [String]) -> Option<&'a str> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return None;
        }
        let lowered: Vec<(String, &'a str)> = budgets
            .iter()
            .map(|b| (b.trim().to_lowercase(), b.as_str()))
            .collect();

        lowered
            .iter()
            .find(|(name, _)| *name == query)
            .or_else(|| lowered.iter().find(|(name, _)| name.starts_with(&query)))
            .or_else(|| lowered.iter().find(|(name, _)| name.contains(&query)))
            .map(|(_, original)| *original)
    }
}
