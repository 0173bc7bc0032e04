//! Queue statistics.

use serde::{Deserialize, Serialize};

/// Counters describing everything a queue has done since construction.
///
/// Counters are cumulative and survive `clear`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStats {
    /// Mutations accepted by `enqueue`.
    pub enqueued: u64,
    /// Items removed after a server-accepted write.
    pub flushed: u64,
    /// Subset of `flushed` the server deduplicated by fingerprint.
    pub idempotent_flushes: u64,
    /// Conflict-driven revision bumps performed.
    pub revisions_bumped: u64,
    /// Items parked stuck after a failed bumped retry.
    pub conflicts_unresolved: u64,
    /// Attempts that ended in the backoff path.
    pub transient_failures: u64,
    /// Completed flush cycles.
    pub flush_cycles: u64,
    /// Epoch-ms of the most recent flush cycle.
    pub last_flush_ms: Option<u64>,
}
