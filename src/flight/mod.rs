//! Single-Flight Module
//!
//! Deduplicates concurrent computations per key: the first caller to miss
//! becomes the leader, every concurrent caller for the same key waits for the
//! leader's outcome instead of recomputing.

mod group;

pub use group::{Flight, FlightGroup, Follower, Leader};
