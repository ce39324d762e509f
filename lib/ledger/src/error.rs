//! Error types for the ledger crate.

use std::fmt;

/// Errors from ledger store operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// A budget with that name already exists.
    NameCollision { name: String },
    /// No budget with that name exists.
    BudgetNotFound { name: String },
    /// Item position outside `[1, len]`.
    PositionOutOfRange { position: usize, len: usize },
    /// The backing store could not be reached.
    Unavailable { reason: String },
}

impl fmt::Display for LedgerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NameCollision { name } => write!(f, "budget already exists: {name}"),
            Self::BudgetNotFound { name } => write!(f, "budget not found: {name}"),
            Self::PositionOutOfRange { position, len } => {
                write!(f, "item position {position} out of range 1..={len}")
            }
            Self::Unavailable { reason } => write!(f, "ledger unavailable: {reason}"),
        }
    }
}

impl std::error::Error for LedgerError {}

/// Errors from document rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// The budget has no items to render.
    EmptyBudget { name: String },
    /// Reading the budget failed.
    Ledger(LedgerError),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyBudget { name } => write!(f, "budget has no items: {name}"),
            Self::Ledger(e) => write!(f, "could not read budget: {e}"),
        }
    }
}

impl std::error::Error for RenderError {}

impl From<LedgerError> for RenderError {
    fn from(e: LedgerError) -> Self {
        Self::Ledger(e)
    }
}
