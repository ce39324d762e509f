//! Time-boxed price cache.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

#[derive(Debug, Clone, Copy)]
struct Entry {
    price: u64,
    resolved_at: DateTime<Utc>,
}

/// Maps normalized item names to recently resolved prices.
///
/// Reads copy the price out under a read lock, so a concurrent purge never
/// invalidates a value a reader already holds.
#[derive(Debug)]
pub struct PriceCache {
    freshness: Duration,
    entries: RwLock<HashMap<String, Entry>>,
}

impl PriceCache {
    /// Creates an empty cache with the given freshness window.
    #[must_use]
    pub fn new(freshness: Duration) -> Self {
        Self {
            freshness,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Normalizes an item name into a cache key.
    #[must_use]
    pub fn key(item: &str) -> String {
        item.trim().to_lowercase()
    }

    /// Returns the cached price if it is younger than the freshness window at `now`.
    #[must_use]
    pub fn get(&self, item: &str, now: DateTime<Utc>) -> Option<u64> {
        let entry = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&Self::key(item))
            .copied()?;
        (now - entry.resolved_at < self.freshness).then_some(entry.price)
    }

    /// Records a price resolved at `now`.
    pub fn insert(&self, item: &str, price: u64, now: DateTime<Utc>) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                Self::key(item),
                Entry {
                    price,
                    resolved_at: now,
                },
            );
    }

    /// Removes entries older than the freshness window. Returns how many were removed.
    pub fn purge_stale(&self, now: DateTime<Utc>) -> usize {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|_, entry| now - entry.resolved_at < self.freshness);
        before - entries.len()
    }

    /// Number of entries, fresh or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns true if the cache holds nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
