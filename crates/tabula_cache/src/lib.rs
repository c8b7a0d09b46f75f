//! Bounded cache of rows seen across fetched pages.
//!
//! The controller fills this cache from every page it applies, so a selection
//! made on page 1 can still be materialized after the user moved to page 5.
//! The oldest entries are evicted first once `max_size` is reached.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

use derive_getters::Getters;
use derive_setters::Setters;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::time::{Duration, Instant};
use tabula_core::RowKey;
use tracing::{debug, trace};

/// Row cache configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Getters, Setters)]
#[setters(prefix = "with_")]
pub struct RowCacheConfig {
    /// Maximum rows kept
    max_size: usize,
    /// Seconds after which a row is considered stale and ignored
    #[setters(strip_option)]
    ttl_secs: Option<u64>,
}

impl Default for RowCacheConfig {
    fn default() -> Self {
        Self {
            max_size: 5_000,
            ttl_secs: None,
        }
    }
}

/// A cached row.
#[derive(Debug, Clone, Getters)]
pub struct CacheEntry<T> {
    /// The row
    value: T,
    /// When the row was last written
    inserted_at: Instant,
}

impl<T> CacheEntry<T> {
    fn is_expired(&self, ttl: Option<Duration>) -> bool {
        ttl.is_some_and(|ttl| self.inserted_at.elapsed() >= ttl)
    }
}

/// Rows keyed by [`RowKey`], evicting oldest first.
#[derive(Debug, Clone)]
pub struct RowCache<T> {
    config: RowCacheConfig,
    entries: HashMap<RowKey, (u64, CacheEntry<T>)>,
    order: BTreeMap<u64, RowKey>,
    next_seq: u64,
}

impl<T> RowCache<T> {
    /// Creates an empty cache.
    pub fn new(config: RowCacheConfig) -> Self {
        Self {
            config,
            entries: HashMap::new(),
            order: BTreeMap::new(),
            next_seq: 0,
        }
    }

    /// The cache configuration.
    pub fn config(&self) -> &RowCacheConfig {
        &self.config
    }

    fn ttl(&self) -> Option<Duration> {
        self.config.ttl_secs.map(Duration::from_secs)
    }

    /// Inserts or refreshes a row. A refreshed row counts as newest.
    pub fn insert(&mut self, key: RowKey, value: T) {
        if self.config.max_size == 0 {
            return;
        }
        if let Some((seq, _)) = self.entries.remove(&key) {
            self.order.remove(&seq);
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        self.order.insert(seq, key.clone());
        self.entries.insert(
            key,
            (
                seq,
                CacheEntry {
                    value,
                    inserted_at: Instant::now(),
                },
            ),
        );

        while self.entries.len() > self.config.max_size {
            let Some((_, oldest)) = self.order.pop_first() else {
                break;
            };
            trace!(key = %oldest, "Evicting cached row");
            self.entries.remove(&oldest);
        }
    }

    /// Inserts every row from an iterator.
    pub fn extend<I: IntoIterator<Item = (RowKey, T)>>(&mut self, rows: I) {
        for (key, value) in rows {
            self.insert(key, value);
        }
    }

    /// The entry for `key`, unless missing or expired.
    pub fn get(&self, key: &RowKey) -> Option<&CacheEntry<T>> {
        let ttl = self.ttl();
        self.entries
            .get(key)
            .map(|(_, entry)| entry)
            .filter(|entry| !entry.is_expired(ttl))
    }

    /// Whether a live entry exists for `key`.
    pub fn contains(&self, key: &RowKey) -> bool {
        self.get(key).is_some()
    }

    /// Removes a row.
    pub fn remove(&mut self, key: &RowKey) -> Option<T> {
        let (seq, entry) = self.entries.remove(key)?;
        self.order.remove(&seq);
        Some(entry.value)
    }

    /// Number of rows held, including expired ones not yet evicted.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every row.
    pub fn clear(&mut self) {
        debug!(rows = self.entries.len(), "Clearing row cache");
        self.entries.clear();
        self.order.clear();
    }
}

impl<T: Clone> RowCache<T> {
    /// Clones the live rows for `keys`, in the order given, skipping misses.
    pub fn collect<'a, I>(&self, keys: I) -> Vec<T>
    where
        I: IntoIterator<Item = &'a RowKey>,
    {
        keys.into_iter()
            .filter_map(|key| self.get(key).map(|entry| entry.value.clone()))
            .collect()
    }
}
