//! In-flight registry
//!
//! One `watch` channel per key in flight. The leader owns the sender and
//! publishes exactly one outcome; followers hold receivers. The registry lock
//! is a plain mutex and is never held across an await point.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tracing::{debug, warn};

use crate::error::{CacheError, Result};

/// `None` until the leader publishes.
type Outcome<V> = Option<Result<V>>;

// == Flight Group ==
/// Registry of computations currently in flight, keyed by cache key.
#[derive(Debug)]
pub struct FlightGroup<V> {
    calls: Mutex<HashMap<String, watch::Receiver<Outcome<V>>>>,
}

/// Role assigned to a caller that joined a flight.
pub enum Flight<'a, V> {
    Leader(Leader<'a, V>),
    Follower(Follower<V>),
}

impl<V: Clone> FlightGroup<V> {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(HashMap::new()),
        }
    }

    fn calls(&self) -> MutexGuard<'_, HashMap<String, watch::Receiver<Outcome<V>>>> {
        // Critical sections only touch the map, a panic cannot leave it half-updated.
        self.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // == Join ==
    /// Registers interest in `key`.
    ///
    /// Creates the in-flight record and returns `Leader` when none exists,
    /// otherwise attaches to the existing record as a `Follower`.
    pub fn join(&self, key: &str) -> Flight<'_, V> {
        let mut calls = self.calls();
        if let Some(rx) = calls.get(key) {
            debug!(key = %key, "Attached to in-flight computation");
            return Flight::Follower(Follower {
                key: key.to_string(),
                rx: rx.clone(),
            });
        }

        let (tx, rx) = watch::channel(None);
        calls.insert(key.to_string(), rx);
        debug!(key = %key, "Elected flight leader");

        Flight::Leader(Leader {
            group: self,
            key: key.to_string(),
            tx,
        })
    }

    // == In Flight ==
    /// Number of keys currently being computed.
    pub fn in_flight(&self) -> usize {
        self.calls().len()
    }
}

impl<V: Clone> Default for FlightGroup<V> {
    fn default() -> Self {
        Self::new()
    }
}

// == Leader ==
/// Exclusive right to compute a key. Dropping it removes the in-flight record;
/// followers of a leader dropped without publishing get `CacheError::Abandoned`.
#[derive(Debug)]
pub struct Leader<'a, V> {
    group: &'a FlightGroup<V>,
    key: String,
    tx: watch::Sender<Outcome<V>>,
}

impl<V> Leader<'_, V> {
    /// Publishes the outcome to every follower and ends the flight.
    pub fn complete(self, outcome: Result<V>) {
        if let Err(err) = &outcome {
            warn!(key = %self.key, error = %err, "Flight failed, delivering error to followers");
        }
        self.tx.send_replace(Some(outcome));
    }
}

impl<V> Drop for Leader<'_, V> {
    fn drop(&mut self) {
        let mut calls = self
            .group
            .calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        calls.remove(&self.key);

        if self.tx.borrow().is_none() {
            warn!(key = %self.key, "Flight leader dropped before publishing");
        }
    }
}

// == Follower ==
/// Waiter attached to another caller's flight.
#[derive(Debug)]
pub struct Follower<V> {
    key: String,
    rx: watch::Receiver<Outcome<V>>,
}

impl<V: Clone> Follower<V> {
    /// Waits for the leader's outcome. Never invokes a computation itself.
    pub async fn wait(mut self) -> Result<V> {
        let published = match self.rx.wait_for(Option::is_some).await {
            Ok(outcome) => outcome.clone(),
            Err(_) => None,
        };
        published.unwrap_or_else(|| Err(CacheError::Abandoned(self.key.clone())))
    }
}
