//! Transport layer abstraction for score mutations.

use crate::error::TransportError;
use fairway_score_protocol::{Fingerprint, PostScoreArgs, PostScoreResult};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

/// A score transport delivers one mutation to the score service.
///
/// This trait abstracts the network layer, allowing for different
/// implementations (HTTP, mock for testing, an in-memory server).
/// `Err` means the call itself failed; a server rejection comes back as
/// an `Ok` result variant.
pub trait ScoreTransport: Send + Sync {
    /// Posts one score mutation and returns the server's verdict.
    fn post_score(&self, args: &PostScoreArgs) -> Result<PostScoreResult, TransportError>;
}

impl<T: ScoreTransport + ?Sized> ScoreTransport for Arc<T> {
    fn post_score(&self, args: &PostScoreArgs) -> Result<PostScoreResult, TransportError> {
        (**self).post_score(args)
    }
}

/// A scripted transport for testing.
///
/// Outcomes are served in push order, and every call's payload is
/// recorded for inspection.
#[derive(Debug, Default)]
pub struct MockTransport {
    script: Mutex<VecDeque<Result<PostScoreResult, TransportError>>>,
    calls: Mutex<Vec<PostScoreArgs>>,
}

impl MockTransport {
    /// Creates a mock with an empty script.
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Queues a server verdict for the next unserved call.
    pub fn push_result(&self, result: PostScoreResult) {
        self.script.lock().push_back(Ok(result));
    }

    /// Queues a transport failure for the next unserved call.
    pub fn push_error(&self, error: TransportError) {
        self.script.lock().push_back(Err(error));
    }

    /// Returns every payload posted so far, in call order.
    pub fn calls(&self) -> Vec<PostScoreArgs> {
        self.calls.lock().clone()
    }
}

impl ScoreTransport for MockTransport {
    fn post_score(&self, args: &PostScoreArgs) -> Result<PostScoreResult, TransportError> {
        self.calls.lock().push(args.clone());
        self.script
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::network("mock script exhausted")))
    }
}

#[derive(Debug, Default)]
struct ServerState {
    revisions: HashMap<(String, u32), u64>,
    applied: HashMap<Fingerprint, u64>,
    offline: bool,
}

/// An in-memory score service implementing the server side of the
/// revision protocol.
///
/// Accepts a write only when its revision is strictly greater than the
/// one on record, answers replayed fingerprints idempotently, and can
/// simulate an outage.
#[derive(Debug, Default)]
pub struct InMemoryScoreServer {
    state: Mutex<ServerState>,
}

impl InMemoryScoreServer {
    /// Creates a server with no recorded scores.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the authoritative revision for one hole of a scorecard.
    pub fn set_revision(&self, scorecard_id: impl Into<String>, hole: u32, revision: u64) {
        self.state
            .lock()
            .revisions
            .insert((scorecard_id.into(), hole), revision);
    }

    /// Returns the authoritative revision for one hole, zero if unwritten.
    pub fn revision(&self, scorecard_id: &str, hole: u32) -> u64 {
        self.state
            .lock()
            .revisions
            .get(&(scorecard_id.to_string(), hole))
            .copied()
            .unwrap_or(0)
    }

    /// Toggles a simulated outage; while offline every call fails.
    pub fn set_offline(&self, offline: bool) {
        self.state.lock().offline = offline;
    }
}

impl ScoreTransport for InMemoryScoreServer {
    fn post_score(&self, args: &PostScoreArgs) -> Result<PostScoreResult, TransportError> {
        let mut state = self.state.lock();
        if state.offline {
            return Err(TransportError::network("simulated outage"));
        }

        if let Some(landed) = state.applied.get(&args.fingerprint) {
            return Ok(PostScoreResult::idempotent(*landed));
        }

        let key = (args.scorecard_id.clone(), args.hole);
        let current = state.revisions.get(&key).copied().unwrap_or(0);
        if args.revision <= current {
            return Ok(PostScoreResult::stale(current));
        }

        state.revisions.insert(key, args.revision);
        state.applied.insert(args.fingerprint.clone(), args.revision);
        Ok(PostScoreResult::success(args.revision))
    }
}
