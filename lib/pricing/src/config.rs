//! Price resolution configuration.

use chrono::Duration;
use serde::Deserialize;

/// Configuration for [`PriceResolver`](crate::PriceResolver).
#[derive(Debug, Clone, Deserialize)]
pub struct PricingConfig {
    /// How long an estimated price stays fresh, in hours.
    #[serde(default = "default_freshness_hours")]
    pub freshness_hours: u32,

    /// Price used when no estimate can be obtained, in whole pesos.
    #[serde(default = "default_fallback_price")]
    pub fallback_price: u64,

    /// Interval between cache purges, in seconds.
    #[serde(default = "default_purge_interval_seconds")]
    pub purge_interval_seconds: u64,
}

fn default_freshness_hours() -> u32 {
    24
}

fn default_fallback_price() -> u64 {
    1000
}

fn default_purge_interval_seconds() -> u64 {
    3600
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            freshness_hours: default_freshness_hours(),
            fallback_price: default_fallback_price(),
            purge_interval_seconds: default_purge_interval_seconds(),
        }
    }
}

impl PricingConfig {
    /// Returns the freshness window.
    #[must_use]
    pub fn freshness(&self) -> Duration {
        Duration::hours(i64::from(self.freshness_hours))
    }

    /// Returns the cache purge period, never shorter than one second.
    #[must_use]
    pub fn purge_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.purge_interval_seconds.max(1))
    }
}
