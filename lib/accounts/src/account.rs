//! Account domain type.
//!
//! An account is a registered customer: a display name, the phone number
//! they chat from, and the ledger their budgets live in. Accounts are
//! provisioned by an administrator; the assistant never creates them.

use budget_chat_core::normalize_phone;
use serde::{Deserialize, Serialize};

/// A registered customer account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Stable account identifier (the normalized phone number).
    account_id: String,
    /// Name shown on rendered documents.
    display_name: String,
    /// Phone number as written in the directory.
    phone: String,
    /// Handle of the ledger holding this account's budgets.
    ledger_handle: Option<String>,
    /// Addresses that receive copies of finished budgets.
    notify_emails: Vec<String>,
}

impl Account {
    /// Creates an account without a ledger.
    #[must_use]
    pub fn new(display_name: impl Into<String>, phone: impl Into<String>) -> Self {
        let phone = phone.into();
        Self {
            account_id: normalize_phone(&phone),
            display_name: display_name.into(),
            phone,
            ledger_handle: None,
            notify_emails: Vec::new(),
        }
    }

    /// Assigns the ledger handle.
    #[must_use]
    pub fn with_ledger_handle(mut self, handle: impl Into<String>) -> Self {
        self.ledger_handle = Some(handle.into());
        self
    }

    /// Sets the notification addresses.
    #[must_use]
    pub fn with_notify_emails(mut self, emails: Vec<String>) -> Self {
        self.notify_emails = emails;
        self
    }

    /// Returns the account identifier.
    #[must_use]
    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    /// Returns the display name.
    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Returns the phone number as configured.
    #[must_use]
    pub fn phone(&self) -> &str {
        &self.phone
    }

    /// Returns the normalized phone used for lookups.
    #[must_use]
    pub fn normalized_phone(&self) -> String {
        normalize_phone(&self.phone)
    }

    /// Returns the ledger handle, if one has been assigned.
    #[must_use]
    pub fn ledger_handle(&self) -> Option<&str> {
        self.ledger_handle.as_deref().filter(|h| !h.trim().is_empty())
    }

    /// Returns the notification addresses.
    #[must_use]
    pub fn notify_emails(&self) -> &[String] {
        &self.notify_emails
    }
}

/// One entry of the directory file.
///
/// Accepts the Spanish keys used by the original provisioning sheet.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct AccountEntry {
    #[serde(alias = "nombre")]
    pub name: String,
    #[serde(alias = "telefono")]
    pub phone: String,
    #[serde(default, alias = "ledgerHandle", alias = "spreadsheetId")]
    pub ledger_handle: Option<String>,
    #[serde(default, alias = "notifyEmails", alias = "email_destino")]
    pub notify_emails: Vec<String>,
}

impl From<AccountEntry> for Account {
    fn from(entry: AccountEntry) -> Self {
        let mut account = Account::new(entry.name, entry.phone).with_notify_emails(entry.notify_emails);
        account.ledger_handle = entry.ledger_handle;
        account
    }
}
