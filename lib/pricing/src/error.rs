//! Error types for the pricing crate.

use std::fmt;

/// Errors from price oracles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The oracle could not be reached or failed.
    OracleFailed { reason: String },
}

impl fmt::Display for PriceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OracleFailed { reason } => write!(f, "price oracle failed: {reason}"),
        }
    }
}

impl std::error::Error for PriceError {}
