//! Flight Cache - A concurrent in-memory cache
//!
//! Provides TTL expiration, a bounded entry count, single-flight computation
//! of missing values and a cancellable background sweeper.

pub mod cache;
pub mod config;
pub mod error;
pub mod flight;
pub mod tasks;

pub use cache::{Cache, CacheStats};
pub use config::Config;
pub use error::{CacheError, Result};
pub use tasks::{spawn_cleanup_task, CleanupHandle};
pub use tokio_util::sync::CancellationToken;
