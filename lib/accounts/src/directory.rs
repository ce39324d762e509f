//! Account lookup by phone number.

use crate::account::{Account, AccountEntry};
use crate::error::DirectoryError;
use budget_chat_core::normalize_phone;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};
use tracing::{info, instrument, warn};

/// Looks up registered accounts.
pub trait AccountDirectory: Send + Sync {
    /// Finds the account registered for a phone number.
    ///
    /// The phone is normalized before lookup, so any formatting works.
    fn lookup(&self, phone: &str) -> Option<Account>;
}

fn index(accounts: impl IntoIterator<Item = Account>) -> HashMap<String, Account> {
    accounts
        .into_iter()
        .map(|account| (account.normalized_phone(), account))
        .collect()
}

/// A fixed, in-memory directory.
#[derive(Debug, Default)]
pub struct StaticDirectory {
    accounts: HashMap<String, Account>,
}

impl StaticDirectory {
    /// Creates a directory from a list of accounts.
    #[must_use]
    pub fn new(accounts: Vec<Account>) -> Self {
        Self {
            accounts: index(accounts),
        }
    }
}

impl AccountDirectory for StaticDirectory {
    fn lookup(&self, phone: &str) -> Option<Account> {
        self.accounts.get(&normalize_phone(phone)).cloned()
    }
}

#[derive(Debug, Deserialize)]
struct DirectoryFile {
    #[serde(default, alias = "clientes")]
    accounts: Vec<AccountEntry>,
}

/// A directory loaded from a JSON file.
///
/// The file is read once at startup. `reload` re-reads it on demand, which
/// is how administrators register new accounts without a restart.
#[derive(Debug)]
pub struct JsonFileDirectory {
    path: PathBuf,
    accounts: RwLock<HashMap<String, Account>>,
}

impl JsonFileDirectory {
    /// Loads the directory file.
    ///
    /// A missing file yields an empty directory so a fresh deployment can
    /// start before any account is provisioned.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DirectoryError> {
        let path = path.as_ref().to_path_buf();
        let accounts = read_accounts(&path)?;
        info!(path = %path.display(), total = accounts.len(), "loaded account directory");
        Ok(Self {
            path,
            accounts: RwLock::new(accounts),
        })
    }

    /// Re-reads the directory file.
    ///
    /// On failure the previously loaded accounts stay in effect.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn reload(&self) -> Result<usize, DirectoryError> {
        let accounts = match read_accounts(&self.path) {
            Ok(accounts) => accounts,
            Err(e) => {
                warn!(error = %e, "directory reload failed, keeping previous accounts");
                return Err(e);
            }
        };
        let total = accounts.len();
        *self.accounts.write().unwrap_or_else(PoisonError::into_inner) = accounts;
        info!(total, "reloaded account directory");
        Ok(total)
    }

    /// Returns the number of registered accounts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.accounts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns true if no accounts are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns a snapshot of all registered accounts.
    #[must_use]
    pub fn accounts(&self) -> Vec<Account> {
        self.accounts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }
}

impl AccountDirectory for JsonFileDirectory {
    fn lookup(&self, phone: &str) -> Option<Account> {
        self.accounts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&normalize_phone(phone))
            .cloned()
    }
}

fn read_accounts(path: &Path) -> Result<HashMap<String, Account>, DirectoryError> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!(path = %path.display(), "account directory not found, starting empty");
            return Ok(HashMap::new());
        }
        Err(e) => {
            return Err(DirectoryError::Read {
                path: path.to_path_buf(),
                reason: e.to_string(),
            });
        }
    };

    let file: DirectoryFile = serde_json::from_str(&raw).map_err(|e| DirectoryError::Parse {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    Ok(index(file.accounts.into_iter().map(Account::from)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &tempfile::TempDir, body: &str) -> PathBuf {
        let path = dir.path().join("accounts.json");
        let mut file = std::fs::File::create(&path).expect("create");
        file.write_all(body.as_bytes()).expect("write");
        path
    }

    #[test]
    fn static_directory_normalizes_lookups() {
        let directory = StaticDirectory::new(vec![
            Account::new("Ashly", "+56 9 1234 5678").with_ledger_handle("sheet"),
        ]);

        assert!(directory.lookup("(56) 9-1234-5678").is_some());
        assert!(directory.lookup("56900000000").is_none());
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let directory = JsonFileDirectory::load(dir.path().join("nope.json")).expect("load");
        assert!(directory.is_empty());
    }

    #[test]
    fn loads_accounts_from_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_file(
            &dir,
            r#"{"clientes": [{"nombre": "Ashly", "telefono": "+56 9 1234 5678", "spreadsheetId": "s1"}]}"#,
        );

        let directory = JsonFileDirectory::load(&path).expect("load");
        assert_eq!(directory.len(), 1);
        let account = directory.lookup("56912345678").expect("account");
        assert_eq!(account.ledger_handle(), Some("s1"));
    }

    #[test]
    fn invalid_file_fails_to_load() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_file(&dir, "{not json");
        let err = JsonFileDirectory::load(&path).unwrap_err();
        assert!(matches!(err, DirectoryError::Parse { .. }));
    }

    #[test]
    fn reload_picks_up_new_accounts() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_file(&dir, r#"{"accounts": []}"#);
        let directory = JsonFileDirectory::load(&path).expect("load");
        assert!(directory.lookup("56911112222").is_none());

        write_file(
            &dir,
            r#"{"accounts": [{"name": "Obra", "phone": "56911112222", "ledgerHandle": "s2"}]}"#,
        );
        assert_eq!(directory.reload().expect("reload"), 1);
        assert!(directory.lookup("+56 9 1111 2222").is_some());
    }

    #[test]
    fn failed_reload_keeps_previous_accounts() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_file(
            &dir,
            r#"{"accounts": [{"name": "Obra", "phone": "56911112222"}]}"#,
        );
        let directory = JsonFileDirectory::load(&path).expect("load");

        write_file(&dir, "garbage");
        assert!(directory.reload().is_err());
        assert_eq!(directory.len(), 1);
        assert!(directory.lookup("56911112222").is_some());
    }
}
