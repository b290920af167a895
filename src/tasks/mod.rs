//! Background Tasks Module
//!
//! Contains background tasks that run alongside the cache.
//!
//! # Tasks
//! - TTL Cleanup: Removes expired cache entries at a configured interval

mod cleanup;

pub use cleanup::{spawn_cleanup_task, CleanupHandle};
