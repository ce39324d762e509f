//! Conversation state for the budget-chat assistant.
//!
//! This crate provides:
//!
//! - **Turns**: the append-only log of what the user and the agent said
//! - **Sessions**: per-user pointers (active budget, ledger handle) and the
//!   pending confirmation for destructive actions
//! - **Session Store**: the storage contract, with an in-memory implementation

pub mod error;
pub mod memory;
pub mod session;
pub mod store;
pub mod turn;

pub use error::SessionError;
pub use memory::InMemorySessionStore;
pub use session::{ConfirmationKind, PendingConfirmation, Session};
pub use store::SessionStore;
pub use turn::{Turn, TurnRole};
