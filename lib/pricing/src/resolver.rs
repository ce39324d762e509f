//! Price resolution with cache, oracle and fallback.

use crate::cache::PriceCache;
use crate::config::PricingConfig;
use crate::oracle::{PriceOracle, parse_price};
use chrono::Utc;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Where a price came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceSource {
    /// A fresh cached estimate.
    Cache,
    /// A new estimate from the oracle.
    Estimated,
    /// The fixed fallback price.
    Default,
}

impl PriceSource {
    /// Provenance label shown to users.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Cache => "cache",
            Self::Estimated => "precio Homecenter",
            Self::Default => "precio estimado",
        }
    }
}

impl fmt::Display for PriceSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Cache => "cache",
            Self::Estimated => "estimated",
            Self::Default => "default",
        })
    }
}

/// A resolved unit price.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceQuote {
    /// Unit price in whole pesos; always positive.
    pub price: u64,
    /// Provenance.
    pub source: PriceSource,
}

/// Resolves unit prices for item names.
pub struct PriceResolver {
    oracle: Arc<dyn PriceOracle>,
    cache: PriceCache,
    fallback_price: u64,
}

impl PriceResolver {
    /// Creates a resolver.
    #[must_use]
    pub fn new(oracle: Arc<dyn PriceOracle>, config: &PricingConfig) -> Self {
        Self {
            oracle,
            cache: PriceCache::new(config.freshness()),
            fallback_price: config.fallback_price.max(1),
        }
    }

    /// Returns a unit price for an item. Never fails.
    ///
    /// Fallback prices are not cached, so the next request retries the oracle.
    #[instrument(skip(self))]
    pub async fn get_price(&self, item: &str) -> PriceQuote {
        if let Some(price) = self.cache.get(item, Utc::now()) {
            debug!(price, "price served from cache");
            return PriceQuote {
                price,
                source: PriceSource::Cache,
            };
        }

        let estimate = match self.oracle.estimate(item).await {
            Ok(answer) => parse_price(&answer).ok_or(answer),
            Err(e) => Err(e.to_string()),
        };

        match estimate {
            Ok(price) => {
                self.cache.insert(item, price, Utc::now());
                info!(price, "price estimated");
                PriceQuote {
                    price,
                    source: PriceSource::Estimated,
                }
            }
            Err(reason) => {
                warn!(reason = %reason, fallback = self.fallback_price, "no usable price estimate, using fallback");
                PriceQuote {
                    price: self.fallback_price,
                    source: PriceSource::Default,
                }
            }
        }
    }

    /// Drops cache entries older than the freshness window.
    pub fn purge_stale(&self) -> usize {
        let removed = self.cache.purge_stale(Utc::now());
        if removed > 0 {
            info!(removed, remaining = self.cache.len(), "purged stale prices");
        }
        removed
    }

    /// Returns the underlying cache.
    #[must_use]
    pub fn cache(&self) -> &PriceCache {
        &self.cache
    }
}
