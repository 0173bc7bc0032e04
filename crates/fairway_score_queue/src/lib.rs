//! # Fairway Score Queue
//!
//! Offline score queue and conflict protocol for Fairway golf clients.
//!
//! This crate provides:
//! - An in-memory queue of pending score mutations
//! - Revision derivation and per-queue idempotency fingerprints
//! - One-bump conflict handling against the score service
//! - Retry with exponential backoff and jitter
//! - HTTP transport abstraction
//! - Injectable clock, randomness and telemetry for deterministic tests
//!
//! ## Architecture
//!
//! The queue implements an **enqueue-then-flush** model:
//! 1. Scores are enqueued locally while the device is offline
//! 2. `flush` posts each due item to the score service
//! 3. Outcomes decide the item's fate: remove, bump once, or back off
//!
//! The server is authoritative for revisions: a retryable conflict
//! carries the server's current revision, and the queue retries exactly
//! once at one above it before parking the item.
//!
//! ## Key Invariants
//!
//! - Server is authoritative for revisions
//! - At most one revision bump per item per flush cycle
//! - The fingerprint changes if and only if the revision changes
//! - Stuck items never dispatch again without outside intervention
//! - Only one flush runs at a time

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod clock;
mod config;
mod error;
mod http;
mod item;
mod policy;
mod queue;
mod random;
mod stats;
mod store;
mod telemetry;
mod transport;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::BackoffPolicy;
pub use error::{QueueError, QueueResult, TransportError};
pub use http::{HttpClient, HttpResponse, HttpScoreTransport, CLIENT_REQ_ID_HEADER};
pub use item::{ItemId, QueueItem, ScoreMutationRequest};
pub use queue::ScoreQueue;
pub use random::{FixedRandom, RandomSource, ThreadRngRandom};
pub use stats::QueueStats;
pub use telemetry::{
    MemorySink, NullSink, TelemetrySink, TracingSink, SCORE_CONFLICT_UNRESOLVED, SCORE_FLUSHED,
    SCORE_RETRY_BUMPED,
};
pub use transport::{InMemoryScoreServer, MockTransport, ScoreTransport};
