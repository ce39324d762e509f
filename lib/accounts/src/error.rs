//! Error types for the accounts crate.

use std::fmt;
use std::path::PathBuf;

/// Errors from loading the account directory.
#[derive(Debug)]
pub enum DirectoryError {
    /// The directory file could not be read.
    Read { path: PathBuf, reason: String },
    /// The directory file is not valid JSON or has the wrong shape.
    Parse { path: PathBuf, reason: String },
}

impl fmt::Display for DirectoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read { path, reason } => {
                write!(f, "failed to read account directory {}: {reason}", path.display())
            }
            Self::Parse { path, reason } => {
                write!(f, "invalid account directory {}: {reason}", path.display())
            }
        }
    }
}

impl std::error::Error for DirectoryError {}
