//! Core types and utilities for the budget-chat assistant.
//!
//! This crate provides the identifiers and error handling foundation shared
//! by every other crate in the workspace.

pub mod error;
pub mod id;

pub use error::Result;
pub use id::{ParseIdError, TurnId, UserId, normalize_phone};
