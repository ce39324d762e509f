//! Account directory for budget-chat.
//!
//! This crate provides:
//! - The `Account` record binding a phone number to a ledger
//! - The `AccountDirectory` lookup trait
//! - A JSON-file backed directory that can be reloaded at runtime
//!
//! # Example
//!
//! ```
//! use budget_chat_accounts::{Account, AccountDirectory, StaticDirectory};
//!
//! let directory = StaticDirectory::new(vec![
//!     Account::new("Constructora Ashly", "+56 9 1234 5678").with_ledger_handle("sheet-123"),
//! ]);
//!
//! let account = directory.lookup("56912345678").expect("registered");
//! assert_eq!(account.ledger_handle(), Some("sheet-123"));
//! ```

pub mod account;
pub mod directory;
pub mod error;

pub use account::Account;
pub use directory::{AccountDirectory, JsonFileDirectory, StaticDirectory};
pub use error::DirectoryError;
