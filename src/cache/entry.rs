//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use std::time::Duration;

use tokio::time::Instant;

/// Longest lifetime an entry can actually get. Larger TTLs (up to
/// `Duration::MAX`) are clamped here instead of overflowing `Instant`.
pub const MAX_TTL: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

// == Cache Entry ==
/// Represents a single cache entry with value and expiry metadata.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: V,
    /// Absolute expiry: write time + ttl
    pub expires_at: Instant,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a new cache entry that expires `ttl` after `now`, or
    /// `MAX_TTL` after `now` when `ttl` is not representable.
    pub fn new(value: V, ttl: Duration, now: Instant) -> Self {
        let expires_at = now
            .checked_add(ttl)
            .unwrap_or_else(|| now + MAX_TTL);
        Self { value, expires_at }
    }

    // == Is Live ==
    /// An entry is live strictly before its expiry instant.
    pub fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }

    // == Is Expired ==
    /// Boundary condition: an entry is expired once `now >= expires_at`, so an
    /// entry read exactly at its expiry instant is already gone.
    pub fn is_expired(&self, now: Instant) -> bool {
        !self.is_live(now)
    }

    // == Time To Live ==
    /// Returns remaining lifetime, saturating at zero for expired entries.
    pub fn ttl_remaining(&self, now: Instant) -> Duration {
        self.expires_at.saturating_duration_since(now)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_creation() {
        let now = Instant::now();
        let entry = CacheEntry::new("test_value".to_string(), Duration::from_secs(60), now);

        assert_eq!(entry.value, "test_value");
        assert_eq!(entry.expires_at, now + Duration::from_secs(60));
        assert!(entry.is_live(now));
        assert!(!entry.is_expired(now));
    }

    #[test]
    fn test_entry_expiration() {
        let now = Instant::now();
        let entry = CacheEntry::new(1u32, Duration::from_millis(100), now);

        assert!(entry.is_live(now + Duration::from_millis(99)));
        assert!(entry.is_expired(now + Duration::from_millis(150)));
    }

    #[test]
    fn test_expiration_boundary_condition() {
        let now = Instant::now();
        let entry = CacheEntry::new("test", Duration::from_millis(50), now);

        // Entry should be expired when current time >= expires_at
        assert!(entry.is_expired(entry.expires_at), "Entry should be expired at boundary");
    }

    #[test]
    fn test_zero_ttl_is_expired_on_insert() {
        let now = Instant::now();
        let entry = CacheEntry::new("test", Duration::ZERO, now);
        assert!(entry.is_expired(now));
    }

    #[test]
    fn test_unrepresentable_ttl_is_clamped() {
        let now = Instant::now();
        let entry = CacheEntry::new("v", Duration::MAX, now);

        assert!(entry.is_live(now + Duration::from_secs(365 * 24 * 60 * 60)));
        assert!(entry.ttl_remaining(now) <= MAX_TTL);
    }

    #[test]
    fn test_ttl_remaining() {
        let now = Instant::now();
        let entry = CacheEntry::new("v", Duration::from_secs(10), now);

        assert_eq!(entry.ttl_remaining(now), Duration::from_secs(10));
        assert_eq!(
            entry.ttl_remaining(now + Duration::from_secs(4)),
            Duration::from_secs(6)
        );
        // TTL remaining should be 0 when expired
        assert_eq!(
            entry.ttl_remaining(now + Duration::from_secs(11)),
            Duration::ZERO
        );
    }
}
