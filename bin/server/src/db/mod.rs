//! Database repositories for the budget-chat server.
//!
//! This module provides PostgreSQL implementations of:
//! - Conversation sessions and turn history
//! - Budget ledgers and line items

pub mod ledger;
pub mod session;

pub use ledger::PgLedgerStore;
pub use session::PgSessionStore;
