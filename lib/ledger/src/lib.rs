//! Budget ledgers for the budget-chat assistant.
//!
//! A ledger is the spreadsheet-like document that holds all of one account's
//! budgets. Each budget is a named, ordered list of [`LineItem`]s addressed by
//! 1-based position. Positions are live indices: deleting item 2 moves item 3
//! to position 2.

pub mod error;
pub mod item;
pub mod memory;
pub mod money;
pub mod render;
pub mod store;

pub use error::{LedgerError, RenderError};
pub use item::{BudgetSummary, LineItem};
pub use memory::InMemoryLedger;
pub use money::{format_clp, format_quantity};
pub use render::{
    ClientDetails, DocumentRenderer, PlainTextRenderer, RenderedDocument, document_filename,
};
pub use store::{LedgerStore, RESERVED_SHEET, same_budget_name};
