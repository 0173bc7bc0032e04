//! The offline score queue.

use crate::clock::{Clock, SystemClock};
use crate::config::BackoffPolicy;
use crate::error::{QueueError, QueueResult};
use crate::item::{ItemId, QueueItem, ScoreMutationRequest};
use crate::policy::{bumped_retry_fate, first_attempt_fate, BumpedRetryFate, FirstAttemptFate};
use crate::random::{RandomSource, ThreadRngRandom};
use crate::stats::QueueStats;
use crate::store::ItemStore;
use crate::telemetry::{
    TelemetrySink, TracingSink, SCORE_CONFLICT_UNRESOLVED, SCORE_FLUSHED, SCORE_RETRY_BUMPED,
};
use crate::transport::ScoreTransport;
use fairway_score_protocol::FingerprintSalt;
use parking_lot::RwLock;
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// An offline-first queue of score mutations.
///
/// `enqueue` accepts hole scores while the device is offline; `flush`
/// walks the due items and posts each one through the transport. A
/// retryable conflict earns exactly one revision bump and immediate
/// retry per cycle; a failed retry parks the item stuck for outside
/// intervention. All other failures reschedule the item with
/// exponential backoff.
///
/// The queue is synchronous and thread-safe behind `&self`. No lock is
/// held across a transport call, and a flush entered while another is
/// in flight returns [`QueueError::FlushInProgress`] instead of
/// interleaving.
pub struct ScoreQueue<T: ScoreTransport> {
    transport: T,
    backoff: BackoffPolicy,
    clock: Arc<dyn Clock>,
    random: Arc<dyn RandomSource>,
    telemetry: Arc<dyn TelemetrySink>,
    store: RwLock<ItemStore>,
    stats: RwLock<QueueStats>,
    flushing: AtomicBool,
}

impl<T: ScoreTransport> ScoreQueue<T> {
    /// Creates a queue over the given transport with wall-clock time,
    /// thread-local randomness and tracing telemetry.
    pub fn new(transport: T) -> Self {
        let random: Arc<dyn RandomSource> = Arc::new(ThreadRngRandom);
        let salt = FingerprintSalt::from_unit(random.next_f64());
        Self {
            transport,
            backoff: BackoffPolicy::default(),
            clock: Arc::new(SystemClock),
            random,
            telemetry: Arc::new(TracingSink),
            store: RwLock::new(ItemStore::new(salt)),
            stats: RwLock::new(QueueStats::default()),
            flushing: AtomicBool::new(false),
        }
    }

    /// Replaces the backoff policy. Apply before enqueuing.
    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }

    /// Replaces the time source. Apply before enqueuing.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replaces the randomness source and re-derives the fingerprint
    /// salt from it. Apply before enqueuing.
    pub fn with_random(mut self, random: Arc<dyn RandomSource>) -> Self {
        let salt = FingerprintSalt::from_unit(random.next_f64());
        self.store.get_mut().set_salt(salt);
        self.random = random;
        self
    }

    /// Replaces the telemetry sink. Apply before enqueuing.
    pub fn with_telemetry(mut self, telemetry: Arc<dyn TelemetrySink>) -> Self {
        self.telemetry = telemetry;
        self
    }

    /// Validates and stores a mutation, returning the queued item.
    ///
    /// The item's revision is derived from the request and its
    /// fingerprint from the queue's salt; nothing is sent until `flush`.
    pub fn enqueue(&self, request: ScoreMutationRequest) -> QueueResult<QueueItem> {
        request.validate()?;
        let item = self.store.write().insert(&request);
        self.stats.write().enqueued += 1;
        debug!(
            id = item.id.value(),
            hole = item.hole,
            revision = item.revision,
            "score mutation enqueued"
        );
        Ok(item)
    }

    /// Flushes due items at the current time.
    ///
    /// Returns the number of items the server accepted this cycle.
    pub fn flush(&self) -> QueueResult<usize> {
        self.flush_at(self.clock.now_ms())
    }

    /// Flushes items due at the given time.
    ///
    /// Fails with [`QueueError::FlushInProgress`] if another flush is
    /// still running; dispatch failures never fail the call, they are
    /// absorbed into item state.
    pub fn flush_at(&self, now_ms: u64) -> QueueResult<usize> {
        if self.flushing.swap(true, Ordering::SeqCst) {
            return Err(QueueError::FlushInProgress);
        }
        let flushed = self.run_cycle(now_ms);
        self.flushing.store(false, Ordering::SeqCst);
        Ok(flushed)
    }

    /// Number of pending items, stuck ones included.
    pub fn len(&self) -> usize {
        self.store.read().len()
    }

    /// Returns true if nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.store.read().is_empty()
    }

    /// Snapshot of every pending item in insertion order.
    pub fn items(&self) -> Vec<QueueItem> {
        self.store.read().items()
    }

    /// Snapshot of the queue's counters.
    pub fn stats(&self) -> QueueStats {
        self.stats.read().clone()
    }

    /// Drops every pending item, stuck ones included. Counters keep
    /// their values.
    pub fn clear(&self) {
        let dropped = {
            let mut store = self.store.write();
            let dropped = store.len();
            store.clear();
            dropped
        };
        debug!(dropped, "score queue cleared");
    }

    fn run_cycle(&self, now_ms: u64) -> usize {
        let due = self.store.read().due_items(now_ms);
        debug!(due = due.len(), now_ms, "flush cycle started");

        let mut flushed = 0;
        for item in due {
            if self.dispatch_item(item, now_ms) {
                flushed += 1;
            }
        }

        {
            let mut stats = self.stats.write();
            stats.flush_cycles += 1;
            stats.last_flush_ms = Some(now_ms);
        }
        debug!(flushed, "flush cycle finished");
        flushed
    }

    /// Posts one due item and applies its fate. True if the item left
    /// the queue through a server-accepted write.
    fn dispatch_item(&self, item: QueueItem, now_ms: u64) -> bool {
        let outcome = self.transport.post_score(&item.to_post_args());
        if let Err(err) = &outcome {
            debug!(
                id = item.id.value(),
                error = %err,
                connectivity = err.is_connectivity(),
                "score post failed"
            );
        }

        let salt = self.store.read().salt();
        let fate = first_attempt_fate(
            &item,
            &outcome,
            now_ms,
            &self.backoff,
            self.random.next_f64(),
            salt,
        );
        match fate {
            FirstAttemptFate::Remove { idempotent } => self.finish_success(item.id, idempotent),
            FirstAttemptFate::Redispatch {
                bumped,
                prev_revision,
            } => {
                self.telemetry.emit(
                    SCORE_RETRY_BUMPED,
                    json!({"prevRev": prev_revision, "newRev": bumped.revision}),
                );
                self.stats.write().revisions_bumped += 1;
                debug!(
                    id = bumped.id.value(),
                    prev_revision,
                    new_revision = bumped.revision,
                    "revision bumped after conflict"
                );
                self.dispatch_bumped(bumped, now_ms)
            }
            FirstAttemptFate::Reschedule { updated } => {
                self.apply_reschedule(updated);
                false
            }
        }
    }

    /// Posts the single bumped retry and applies its fate.
    fn dispatch_bumped(&self, bumped: QueueItem, now_ms: u64) -> bool {
        let outcome = self.transport.post_score(&bumped.to_post_args());
        if let Err(err) = &outcome {
            debug!(id = bumped.id.value(), error = %err, "bumped retry post failed");
        }

        match bumped_retry_fate(&bumped, &outcome, now_ms) {
            BumpedRetryFate::Remove { idempotent } => self.finish_success(bumped.id, idempotent),
            BumpedRetryFate::Stick { stuck, rev_tried } => {
                let id = stuck.id;
                let hole = stuck.hole;
                if self.store.write().replace(stuck) {
                    self.telemetry.emit(
                        SCORE_CONFLICT_UNRESOLVED,
                        json!({"hole": hole, "revTried": rev_tried}),
                    );
                    self.stats.write().conflicts_unresolved += 1;
                    warn!(
                        id = id.value(),
                        hole, rev_tried, "conflict unresolved after bumped retry"
                    );
                }
                false
            }
        }
    }

    /// Removes an accepted item and records the success. False if the
    /// item had already left the store.
    fn finish_success(&self, id: ItemId, idempotent: bool) -> bool {
        let removed = self.store.write().remove(id);
        if removed {
            self.telemetry.emit(
                SCORE_FLUSHED,
                json!({"count": 1, "idempotent": idempotent}),
            );
            let mut stats = self.stats.write();
            stats.flushed += 1;
            if idempotent {
                stats.idempotent_flushes += 1;
            }
            debug!(id = id.value(), idempotent, "score flushed");
        }
        removed
    }

    /// Writes a rescheduled item back, if it is still stored.
    fn apply_reschedule(&self, updated: QueueItem) {
        let id = updated.id;
        let attempts = updated.attempts;
        let stuck = updated.stuck;
        let next_at_ms = updated.next_at_ms;
        if self.store.write().replace(updated) {
            self.stats.write().transient_failures += 1;
            if stuck {
                warn!(
                    id = id.value(),
                    attempts, "attempt ceiling reached, score parked"
                );
            } else {
                debug!(
                    id = id.value(),
                    attempts,
                    next_at_ms = ?next_at_ms,
                    "score attempt rescheduled"
                );
            }
        }
    }
}
