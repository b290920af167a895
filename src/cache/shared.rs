//! Concurrent Cache
//!
//! Public cache component: the store behind a reader/writer lock plus the
//! single-flight registry used by `get_or_compute`.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::cache::{CacheStats, CacheStore};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::flight::{Flight, FlightGroup};
use crate::tasks::{spawn_cleanup_task, CleanupHandle};

// == Cache ==
/// Thread-safe TTL cache with bounded size and deduplicated computation.
///
/// Lookups share the read side of the lock; writes, deletes, evictions and
/// sweeps take the write side. Computations never run under the store lock.
#[derive(Debug)]
pub struct Cache<V> {
    store: RwLock<CacheStore<V>>,
    flights: FlightGroup<V>,
}

impl<V> Cache<V>
where
    V: Clone + Send + Sync + 'static,
{
    // == Constructor ==
    /// Creates a cache whose entries live for `ttl` and which holds at most
    /// `max_size` entries.
    pub fn new(ttl: Duration, max_size: usize) -> Self {
        Self {
            store: RwLock::new(CacheStore::new(max_size, ttl)),
            flights: FlightGroup::new(),
        }
    }

    /// Creates a cache from configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.ttl(), config.max_entries)
    }

    // == Get ==
    /// Returns the value for `key` if present and unexpired.
    pub async fn get(&self, key: &str) -> Option<V> {
        self.store.read().await.get(key)
    }

    // == Set ==
    /// Inserts or overwrites `key`, resetting its expiry.
    pub async fn set(&self, key: impl Into<String>, value: V) {
        self.store.write().await.set(key.into(), value);
    }

    // == Delete ==
    /// Removes `key`. Returns whether an entry was removed.
    pub async fn delete(&self, key: &str) -> bool {
        self.store.write().await.delete(key)
    }

    // == Stats ==
    /// Consistent snapshot: size is read under the same lock acquisition as
    /// the counters, so it never reflects a half-applied write.
    pub async fn stats(&self) -> CacheStats {
        self.store.read().await.stats()
    }

    /// Remaining lifetime of a live entry. Does not count as a hit or miss.
    pub async fn ttl_remaining(&self, key: &str) -> Option<Duration> {
        self.store.read().await.ttl_remaining(key)
    }

    pub async fn len(&self) -> usize {
        self.store.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.store.read().await.is_empty()
    }

    // == Cleanup ==
    /// Runs one sweep, removing every expired entry. Returns the count removed.
    pub async fn cleanup(&self) -> usize {
        self.store.write().await.cleanup_expired()
    }

    // == Get Or Compute ==
    /// Returns the cached value for `key`, computing and caching it on a miss.
    ///
    /// Concurrent misses on the same key run `compute` once: the first caller
    /// leads, the rest wait for its outcome. A failure is delivered to the
    /// leader and every follower alike and is not cached. There is no implicit
    /// retry; calling again after a failure starts a new deduplicated flight.
    pub async fn get_or_compute<F, Fut>(&self, key: &str, compute: F) -> Result<V>
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = anyhow::Result<V>>,
    {
        if let Some(value) = self.get(key).await {
            return Ok(value);
        }

        let leader = match self.flights.join(key) {
            Flight::Follower(follower) => return follower.wait().await,
            Flight::Leader(leader) => leader,
        };

        // Another flight may have published between our miss and the election.
        let published = self.store.read().await.peek(key);
        if let Some(value) = published {
            debug!(key = %key, "Value published by previous flight, skipping compute");
            leader.complete(Ok(value.clone()));
            return Ok(value);
        }

        let outcome = compute(key.to_string())
            .await
            .map_err(|err| CacheError::compute(key, &err));

        if let Ok(value) = &outcome {
            self.set(key, value.clone()).await;
        }
        leader.complete(outcome.clone());
        outcome
    }

    /// Number of keys with a computation currently in flight.
    pub fn in_flight(&self) -> usize {
        self.flights.in_flight()
    }

    // == Start Cleanup ==
    /// Spawns the background sweeper. It runs until `cancel` fires.
    pub fn start_cleanup(
        self: &Arc<Self>,
        cancel: CancellationToken,
        interval: Duration,
    ) -> Result<CleanupHandle> {
        spawn_cleanup_task(Arc::clone(self), interval, cancel)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn test_cache() -> Cache<String> {
        Cache::new(Duration::from_secs(300), 100)
    }

    #[tokio::test]
    async fn test_get_never_written() {
        let cache = test_cache();
        assert!(cache.get("missing").await.is_none());
        assert_eq!(cache.stats().await.misses, 1);
    }

    #[tokio::test]
    async fn test_set_get_delete() {
        let cache = test_cache();

        cache.set("k", "v".to_string()).await;
        assert_eq!(cache.get("k").await.as_deref(), Some("v"));

        assert!(cache.delete("k").await);
        assert!(!cache.delete("k").await);
        assert!(cache.get("k").await.is_none());

        let stats = cache.stats().await;
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.size, 0);
    }

    #[tokio::test]
    async fn test_get_or_compute_caches_value() {
        let cache = test_cache();
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let value = cache
                .get_or_compute("k", |key| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async move { Ok(format!("computed {}", key)) }
                })
                .await
                .unwrap();
            assert_eq!(value, "computed k");
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let stats = cache.stats().await;
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 2);
        assert_eq!(cache.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_get_or_compute_error_not_cached() {
        let cache = test_cache();

        let result = cache
            .get_or_compute("k", |_| async { Err(anyhow::anyhow!("upstream down")) })
            .await;
        assert_eq!(
            result,
            Err(CacheError::Compute {
                key: "k".to_string(),
                reason: "upstream down".to_string(),
            })
        );
        assert!(cache.is_empty().await);

        // Retrying is explicit and starts a fresh flight
        let retried = cache
            .get_or_compute("k", |_| async { Ok("recovered".to_string()) })
            .await;
        assert_eq!(retried, Ok("recovered".to_string()));
    }

    #[tokio::test]
    async fn test_ttl_remaining() {
        let cache = test_cache();
        cache.set("k", "v".to_string()).await;

        let remaining = cache.ttl_remaining("k").await.unwrap();
        assert!(remaining <= Duration::from_secs(300));
        assert!(remaining > Duration::from_secs(299));
        assert!(cache.ttl_remaining("other").await.is_none());
        // Inspection is not a lookup
        assert_eq!(cache.stats().await.hits + cache.stats().await.misses, 0);
    }

    #[tokio::test]
    async fn test_zero_ttl_never_found() {
        let cache: Cache<String> = Cache::new(Duration::ZERO, 10);

        cache.set("k", "v".to_string()).await;
        assert!(cache.get("k").await.is_none());
        assert!(cache.ttl_remaining("k").await.is_none());
        assert_eq!(cache.stats().await.misses, 1);
    }

    #[tokio::test]
    async fn test_zero_capacity_still_computes() {
        let cache: Cache<String> = Cache::new(Duration::from_secs(60), 0);
        let calls = AtomicUsize::new(0);

        for _ in 0..2 {
            let value = cache
                .get_or_compute("k", |key| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async move { Ok(format!("computed {}", key)) }
                })
                .await;
            assert_eq!(value, Ok("computed k".to_string()));
        }

        // Nothing is retained, so the second call computes again
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(cache.is_empty().await);
        assert_eq!(cache.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_max_ttl_set_and_compute_do_not_panic() {
        let cache: Cache<u32> = Cache::new(Duration::MAX, 2);

        cache.set("a", 1).await;
        cache.set("b", 2).await;
        let computed = cache.get_or_compute("c", |_| async { Ok(3) }).await;

        assert_eq!(computed, Ok(3));
        assert_eq!(cache.len().await, 2);
        assert_eq!(cache.get("c").await, Some(3));
        assert_eq!(cache.stats().await.evictions, 1);
    }

    #[tokio::test]
    async fn test_from_config() {
        let config = Config {
            ttl_ms: 1000,
            max_entries: 1,
            cleanup_interval_ms: 100,
        };
        let cache: Cache<u32> = Cache::from_config(&config);

        cache.set("a", 1).await;
        cache.set("b", 2).await;
        assert_eq!(cache.len().await, 1);
        assert_eq!(cache.get("b").await, Some(2));
    }
}
