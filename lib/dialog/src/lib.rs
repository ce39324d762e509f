//! Dialog orchestration for the budget-chat assistant.
//!
//! The [`Orchestrator`] turns one inbound utterance into one reply. It
//! records the turn, asks the classifier what the user wants, runs exactly
//! one action against the ledger, session and price collaborators, records
//! and sends the reply, and trims old history in the background.
//!
//! Multi-turn flows (picking a budget, asking for missing item details,
//! confirming a budget deletion) keep their state in the user's
//! [`Session`](budget_chat_conversation::Session), never in the orchestrator.
//!
//! # Limitations
//!
//! - Redelivered messages are processed again; there is no deduplication.
//! - Concurrent messages from one user race at the session store
//!   (last write wins).
//! - Multi-item additions are not rolled back: items persisted before a
//!   failure stay in the budget.

pub mod config;
pub mod error;
pub mod gateway;
pub mod matcher;
pub mod orchestrator;
pub mod replies;

mod handlers;

#[cfg(test)]
mod test_support;

pub use config::DialogConfig;
pub use error::DialogError;
pub use gateway::{GatewayError, MessageGateway, OutboundDocument};
pub use matcher::{BudgetMatcher, SubstringMatcher, TieredMatcher};
pub use orchestrator::{Collaborators, Orchestrator};
