//! TTL Cleanup Task
//!
//! Background task that periodically removes expired cache entries until its
//! cancellation token fires.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cache::Cache;
use crate::error::{CacheError, Result};

// == Cleanup Handle ==
/// Owner handle for a running sweeper.
///
/// The task listens on a child of the caller's token: cancelling the caller's
/// token stops it, and so does `stop` or dropping the handle, without
/// cancelling the caller's token.
#[derive(Debug)]
pub struct CleanupHandle {
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl CleanupHandle {
    /// Stops the sweeper and waits for the task to exit.
    pub async fn stop(self) {
        self.cancel.cancel();
        self.join().await;
    }

    /// Waits for the task to exit after the token was fired elsewhere.
    pub async fn join(mut self) {
        if let Some(handle) = self.handle.take() {
            if let Err(err) = handle.await {
                warn!(error = %err, "Cleanup task terminated abnormally");
            }
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, JoinHandle::is_finished)
    }
}

impl Drop for CleanupHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Spawns a background task that periodically cleans up expired cache entries.
///
/// Each tick takes the store's write lock once, drops every entry whose
/// expiry has passed and releases it. Cancellation is observed while waiting
/// for the next tick, so the task exits within one interval of `cancel` firing.
///
/// # Arguments
/// * `cache` - Shared reference to the cache
/// * `interval` - Time between sweeps, must be non-zero
/// * `cancel` - Stops the loop when cancelled
///
/// # Example
/// ```ignore
/// let cache = Arc::new(Cache::<String>::new(Duration::from_secs(2), 100));
/// let cancel = CancellationToken::new();
/// let sweeper = spawn_cleanup_task(cache.clone(), Duration::from_secs(1), cancel)?;
/// // Later, during shutdown:
/// sweeper.stop().await;
/// ```
pub fn spawn_cleanup_task<V>(
    cache: Arc<Cache<V>>,
    interval: Duration,
    cancel: CancellationToken,
) -> Result<CleanupHandle>
where
    V: Clone + Send + Sync + 'static,
{
    if interval.is_zero() {
        return Err(CacheError::InvalidConfig(
            "cleanup interval must be greater than zero".to_string(),
        ));
    }

    let cancel = cancel.child_token();
    let token = cancel.clone();
    let handle = tokio::spawn(async move {
        info!(interval_ms = interval.as_millis() as u64, "Starting TTL cleanup task");

        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    info!("TTL cleanup task cancelled");
                    break;
                }
                _ = tokio::time::sleep(interval) => {
                    let removed = cache.cleanup().await;
                    if removed > 0 {
                        info!(removed, "TTL cleanup: removed expired entries");
                    } else {
                        debug!("TTL cleanup: no expired entries found");
                    }
                }
            }
        }
    });

    Ok(CleanupHandle {
        cancel,
        handle: Some(handle),
    })
}
