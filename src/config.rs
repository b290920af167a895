//! Configuration Module
//!
//! Handles loading and managing cache configuration from environment variables.

use std::env;
use std::time::Duration;

use crate::error::{CacheError, Result};

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Time-to-live applied to every entry, in milliseconds
    pub ttl_ms: u64,
    /// Maximum number of entries the cache can hold
    pub max_entries: usize,
    /// Background sweep interval in milliseconds
    pub cleanup_interval_ms: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_TTL_MS` - Entry TTL in milliseconds (default: 5000)
    /// - `MAX_ENTRIES` - Maximum cache entries (default: 100)
    /// - `CLEANUP_INTERVAL_MS` - Sweep frequency in milliseconds (default: 1000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            ttl_ms: env_or("CACHE_TTL_MS", defaults.ttl_ms),
            max_entries: env_or("MAX_ENTRIES", defaults.max_entries),
            cleanup_interval_ms: env_or("CLEANUP_INTERVAL_MS", defaults.cleanup_interval_ms),
        }
    }

    /// Rejects settings the sweeper cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.cleanup_interval_ms == 0 {
            return Err(CacheError::InvalidConfig(
                "CLEANUP_INTERVAL_MS must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms)
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_millis(self.cleanup_interval_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ttl_ms: 5000,
            max_entries: 100,
            cleanup_interval_ms: 1000,
        }
    }
}

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
