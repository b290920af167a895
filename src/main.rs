//! Flight Cache demo
//!
//! Replays two usage scenarios against the cache: a burst of concurrent
//! `get_or_compute` callers sharing two keys, and TTL reclamation by the
//! background sweeper.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use tokio::task::JoinSet;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use flight_cache::{Cache, CancellationToken, Config};

const WORKERS: usize = 10;
const LOOKUPS_PER_WORKER: usize = 3;

/// Main entry point for the demo.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Run the deduplication scenario
/// 4. Run the sweeper scenario
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "flight_cache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    config.validate()?;
    info!(
        ttl_ms = config.ttl_ms,
        max_entries = config.max_entries,
        cleanup_interval_ms = config.cleanup_interval_ms,
        "Configuration loaded"
    );

    dedup_scenario(&config).await?;
    sweeper_scenario(&config).await?;

    info!("Demo complete");
    Ok(())
}

/// Simulates a slow upstream lookup.
async fn expensive_computation(key: String, calls: Arc<AtomicUsize>) -> anyhow::Result<String> {
    calls.fetch_add(1, Ordering::SeqCst);
    info!(key = %key, "Computing value");
    tokio::time::sleep(Duration::from_millis(100)).await;
    Ok(format!("result for {}", key))
}

/// Ten workers resolve `key0`/`key1` three times each. Only the first miss per
/// key computes; everyone else either follows that flight or hits the cache.
async fn dedup_scenario(config: &Config) -> anyhow::Result<()> {
    info!("== Scenario 1: deduplicated computation ==");

    let cache: Arc<Cache<String>> = Arc::new(Cache::from_config(config));
    let calls = Arc::new(AtomicUsize::new(0));
    let started = Instant::now();

    let mut workers = JoinSet::new();
    for id in 0..WORKERS {
        let cache = cache.clone();
        let calls = calls.clone();
        workers.spawn(async move {
            for round in 0..LOOKUPS_PER_WORKER {
                let key = format!("key{}", round % 2);
                let calls = calls.clone();
                let value = cache
                    .get_or_compute(&key, |k| expensive_computation(k, calls))
                    .await?;
                info!(worker = id, key = %key, value = %value, "Resolved");
            }
            Ok::<_, flight_cache::CacheError>(())
        });
    }

    while let Some(joined) = workers.join_next().await {
        joined.context("worker task panicked")??;
    }

    let stats = cache.stats().await;
    info!(
        computations = calls.load(Ordering::SeqCst),
        elapsed_ms = started.elapsed().as_millis() as u64,
        hit_rate = %format!("{:.1}%", stats.hit_rate() * 100.0),
        "Scenario 1 finished"
    );
    println!("{}", serde_json::to_string_pretty(&stats)?);

    Ok(())
}

/// Inserts five entries with a 2s TTL and lets the sweeper reclaim them.
async fn sweeper_scenario(config: &Config) -> anyhow::Result<()> {
    info!("== Scenario 2: background sweeper ==");

    let cache: Arc<Cache<String>> =
        Arc::new(Cache::new(Duration::from_secs(2), config.max_entries));
    let sweeper = cache.start_cleanup(CancellationToken::new(), config.cleanup_interval())?;

    for i in 0..5 {
        cache.set(format!("key{}", i), format!("value{}", i)).await;
    }
    info!(size = cache.len().await, "Added 5 entries");

    tokio::time::sleep(Duration::from_secs(3)).await;
    info!(size = cache.len().await, "Size after 3s");

    sweeper.stop().await;
    println!("{}", serde_json::to_string_pretty(&cache.stats().await)?);

    Ok(())
}
