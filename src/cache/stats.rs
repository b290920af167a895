//! Cache Statistics Module
//!
//! Tracks cache performance metrics including hits, misses, and evictions.
//!
//! Counters live in atomics so lookups can record outcomes while holding only
//! the shared side of the store lock.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

// == Stats Counters ==
/// Live, monotonically increasing counters owned by the store.
#[derive(Debug, Default)]
pub struct StatsCounters {
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
    expired_removed: AtomicU64,
}

impl StatsCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_eviction(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
    }

    /// Adds the number of entries a sweep reclaimed.
    pub fn record_expired(&self, count: usize) {
        self.expired_removed.fetch_add(count as u64, Ordering::Relaxed);
    }

    // == Snapshot ==
    /// Freezes the counters together with the entry count read by the caller.
    pub fn snapshot(&self, size: usize) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            expired_removed: self.expired_removed.load(Ordering::Relaxed),
            size,
        }
    }
}

// == Cache Stats ==
/// Point-in-time view of cache performance metrics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Number of successful cache retrievals
    pub hits: u64,
    /// Number of failed cache retrievals (key not found or expired)
    pub misses: u64,
    /// Number of entries evicted to respect the size bound
    pub evictions: u64,
    /// Number of expired entries reclaimed by sweeps
    pub expired_removed: u64,
    /// Current number of entries in the cache
    pub size: usize,
}

impl CacheStats {
    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no requests have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_start_at_zero() {
        let stats = StatsCounters::new().snapshot(0);
        assert_eq!(stats, CacheStats::default());
    }

    #[test]
    fn test_hit_rate_no_requests() {
        let stats = CacheStats::default();
        assert_eq!(stats.hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate_all_hits() {
        let counters = StatsCounters::new();
        counters.record_hit();
        counters.record_hit();
        counters.record_hit();
        assert_eq!(counters.snapshot(0).hit_rate(), 1.0);
    }

    #[test]
    fn test_hit_rate_mixed() {
        let counters = StatsCounters::new();
        counters.record_hit();
        counters.record_miss();
        assert_eq!(counters.snapshot(0).hit_rate(), 0.5);
    }

    #[test]
    fn test_record_eviction_and_expired() {
        let counters = StatsCounters::new();
        counters.record_eviction();
        counters.record_eviction();
        counters.record_expired(3);

        let stats = counters.snapshot(7);
        assert_eq!(stats.evictions, 2);
        assert_eq!(stats.expired_removed, 3);
        assert_eq!(stats.size, 7);
    }

    #[test]
    fn test_stats_serialize() {
        let stats = CacheStats {
            hits: 2,
            misses: 1,
            evictions: 0,
            expired_removed: 0,
            size: 1,
        };
        let json = serde_json::to_value(stats).unwrap();
        assert_eq!(json["hits"], 2);
        assert_eq!(json["size"], 1);
    }
}
