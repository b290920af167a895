//! Cache Module
//!
//! Provides in-memory caching with TTL expiration, a bounded entry count and
//! deduplicated computation of missing values.

mod entry;
mod shared;
mod stats;
mod store;


// Re-export public types
pub use entry::{CacheEntry, MAX_TTL};
pub use shared::Cache;
pub use stats::{CacheStats, StatsCounters};
pub use store::CacheStore;
