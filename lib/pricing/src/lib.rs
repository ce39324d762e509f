//! Unit price resolution.
//!
//! [`PriceResolver`] answers "how much does one of these cost?" for any item
//! name. It consults a time-boxed [`PriceCache`] first, then a
//! [`PriceOracle`], and falls back to a fixed price so item ingestion never
//! blocks on a failed lookup.

pub mod cache;
pub mod config;
pub mod error;
pub mod oracle;
pub mod resolver;

pub use cache::PriceCache;
pub use config::PricingConfig;
pub use error::PriceError;
pub use oracle::{LlmPriceOracle, PriceOracle, parse_price};
pub use resolver::{PriceQuote, PriceResolver, PriceSource};
