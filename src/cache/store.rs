//! Cache Store Module
//!
//! HashMap storage with TTL expiration and a bounded entry count. The store
//! itself is not synchronized; `Cache` wraps it in a reader/writer lock.

use std::collections::HashMap;
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use crate::cache::{CacheEntry, CacheStats, StatsCounters};

// == Cache Store ==
/// Bounded key-value storage with TTL support.
#[derive(Debug)]
pub struct CacheStore<V> {
    /// Key-value storage
    entries: HashMap<String, CacheEntry<V>>,
    /// Performance statistics
    stats: StatsCounters,
    /// Maximum number of entries allowed
    max_entries: usize,
    /// TTL applied to every write
    ttl: Duration,
}

impl<V: Clone> CacheStore<V> {
    // == Constructor ==
    /// Creates a new CacheStore with specified capacity and TTL.
    ///
    /// # Arguments
    /// * `max_entries` - Maximum number of entries the cache can hold
    /// * `ttl` - Lifetime given to every entry at write time
    pub fn new(max_entries: usize, ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            stats: StatsCounters::new(),
            max_entries,
            ttl,
        }
    }

    // == Set ==
    /// Stores a key-value pair, resetting its expiry to `now + ttl`.
    ///
    /// If the key is new and the store is full, exactly one arbitrary entry
    /// is evicted first. No recency or frequency is consulted; callers must
    /// not rely on which key goes.
    pub fn set(&mut self, key: String, value: V) {
        if self.max_entries == 0 {
            debug!(key = %key, "Zero-capacity cache, dropping write");
            return;
        }

        let entry = CacheEntry::new(value, self.ttl, Instant::now());

        let is_overwrite = self.entries.contains_key(&key);
        if !is_overwrite && self.entries.len() >= self.max_entries {
            self.evict_one();
        }
        self.entries.insert(key, entry);
    }

    // == Evict One ==
    /// Removes whichever key the map iterator yields first.
    fn evict_one(&mut self) {
        let victim = self.entries.keys().next().cloned();
        if let Some(victim) = victim {
            self.entries.remove(&victim);
            self.stats.record_eviction();
            debug!(key = %victim, "Evicted entry to respect size bound");
        }
    }

    // == Get ==
    /// Retrieves a live value by key, recording a hit or a miss.
    ///
    /// Expired entries are reported as misses but left in place for the
    /// sweeper, so this only needs shared access.
    pub fn get(&self, key: &str) -> Option<V> {
        match self.peek(key) {
            Some(value) => {
                self.stats.record_hit();
                Some(value)
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    // == Peek ==
    /// Like `get` but without touching the hit/miss counters.
    pub fn peek(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        self.entries
            .get(key)
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.value.clone())
    }

    // == Delete ==
    /// Removes an entry by key. Returns whether anything was removed.
    pub fn delete(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    // == Expiry Inspection ==
    /// Expiry instant of a live entry.
    pub fn expires_at(&self, key: &str) -> Option<Instant> {
        let now = Instant::now();
        self.entries
            .get(key)
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.expires_at)
    }

    /// Remaining lifetime of a live entry.
    pub fn ttl_remaining(&self, key: &str) -> Option<Duration> {
        let now = Instant::now();
        self.entries
            .get(key)
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.ttl_remaining(now))
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.stats.snapshot(self.entries.len())
    }

    // == Cleanup Expired ==
    /// Removes all entries with `expires_at <= now`.
    ///
    /// Returns the number of entries removed.
    pub fn cleanup_expired(&mut self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_live(now));

        let removed = before - self.entries.len();
        self.stats.record_expired(removed);
        removed
    }

    // == Length ==
    /// Returns the number of stored entries, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
