//! Error types for the cache
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache.
///
/// Lookups never fail: absence is `None`. Errors only come out of
/// `get_or_compute` and configuration checks. The type is `Clone` because a
/// single flight outcome is handed to every waiter of that flight.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// The compute function failed for the flight leader
    #[error("Computation failed for key {key}: {reason}")]
    Compute { key: String, reason: String },

    /// The leader went away before publishing a result
    #[error("Computation abandoned for key: {0}")]
    Abandoned(String),

    /// Configuration rejected
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl CacheError {
    /// Wraps a compute failure, keeping the whole `anyhow` context chain.
    pub fn compute(key: &str, err: &anyhow::Error) -> Self {
        CacheError::Compute {
            key: key.to_string(),
            reason: format!("{:#}", err),
        }
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_compute_error_keeps_context_chain() {
        let err = Err::<(), _>(anyhow::anyhow!("connection refused"))
            .context("loading rate")
            .unwrap_err();

        let cache_err = CacheError::compute("usd", &err);
        assert_eq!(
            cache_err,
            CacheError::Compute {
                key: "usd".to_string(),
                reason: "loading rate: connection refused".to_string(),
            }
        );
        assert!(cache_err.to_string().contains("usd"));
    }

    #[test]
    fn test_abandoned_display() {
        let err = CacheError::Abandoned("k".to_string());
        assert_eq!(err.to_string(), "Computation abandoned for key: k");
    }
}
