//! Queue items and the mutations that create them.

use crate::error::{QueueError, QueueResult};
use fairway_score_protocol::{Fingerprint, FingerprintSalt, PostScoreArgs};
use serde::{Deserialize, Serialize};

/// Stable identity of a queued item within its store.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct ItemId(u64);

impl ItemId {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw id value.
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Caller input to `enqueue`: one hole score to synchronize.
///
/// The revision the write will carry is derived at enqueue time: an
/// explicit revision is clamped to at least 1, otherwise a known base
/// revision yields base plus one, otherwise the write starts at 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreMutationRequest {
    /// Caller-defined correlation id for the event being scored.
    pub event_id: String,
    /// Scorecard the mutation applies to.
    pub scorecard_id: String,
    /// Hole number, 1-based.
    pub hole: u32,
    /// Stroke count for the hole.
    pub strokes: u32,
    /// Putt count for the hole, when recorded.
    pub putts: Option<u32>,
    /// The client's last-known revision of this write, when it has one.
    pub revision: Option<u64>,
    /// The scorecard revision this write builds on, when known instead.
    pub base_revision: Option<u64>,
}

impl ScoreMutationRequest {
    /// Creates a request for the given event, scorecard, hole and strokes.
    pub fn new(
        event_id: impl Into<String>,
        scorecard_id: impl Into<String>,
        hole: u32,
        strokes: u32,
    ) -> Self {
        Self {
            event_id: event_id.into(),
            scorecard_id: scorecard_id.into(),
            hole,
            strokes,
            putts: None,
            revision: None,
            base_revision: None,
        }
    }

    /// Sets the putt count.
    pub fn with_putts(mut self, putts: u32) -> Self {
        self.putts = Some(putts);
        self
    }

    /// Sets the client's last-known revision for this write.
    pub fn with_revision(mut self, revision: u64) -> Self {
        self.revision = Some(revision);
        self
    }

    /// Derives the write's revision from a known base revision.
    pub fn with_base_revision(mut self, base_revision: u64) -> Self {
        self.base_revision = Some(base_revision);
        self
    }

    /// The revision the queued write will carry.
    pub fn effective_revision(&self) -> u64 {
        if let Some(revision) = self.revision {
            return revision.max(1);
        }
        if let Some(base) = self.base_revision {
            return base.saturating_add(1).max(1);
        }
        1
    }

    pub(crate) fn validate(&self) -> QueueResult<()> {
        if self.event_id.is_empty() {
            return Err(QueueError::invalid_mutation("event id must not be empty"));
        }
        if self.scorecard_id.is_empty() {
            return Err(QueueError::invalid_mutation(
                "scorecard id must not be empty",
            ));
        }
        if self.hole == 0 {
            return Err(QueueError::invalid_mutation("hole must be 1 or greater"));
        }
        Ok(())
    }
}

/// One pending score mutation and its dispatch bookkeeping.
///
/// Snapshots serialize, so callers layering a durable store on top can
/// persist the queue between runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueItem {
    /// Stable id of this item within its store.
    pub id: ItemId,
    /// Caller-defined correlation id for the event being scored.
    pub event_id: String,
    /// Scorecard the mutation applies to.
    pub scorecard_id: String,
    /// Hole number, 1-based.
    pub hole: u32,
    /// Stroke count for the hole.
    pub strokes: u32,
    /// Putt count for the hole, when recorded.
    pub putts: Option<u32>,
    /// Revision this write currently carries.
    pub revision: u64,
    /// Idempotency token for this write at this revision.
    pub fingerprint: Fingerprint,
    /// Failed dispatch attempts so far; never decreases.
    pub attempts: u32,
    /// True once a conflict retry has failed; cleared only by outside
    /// intervention.
    pub stuck: bool,
    /// Earliest epoch-ms the dispatch loop may try this item again.
    /// Absent means immediately eligible.
    pub next_at_ms: Option<u64>,
}

impl QueueItem {
    /// Returns true if the dispatch loop may attempt this item now.
    pub fn is_due(&self, now_ms: u64) -> bool {
        !self.stuck && self.next_at_ms.map_or(true, |at| at <= now_ms)
    }

    /// Builds the outbound payload for this item's current state.
    pub fn to_post_args(&self) -> PostScoreArgs {
        PostScoreArgs {
            event_id: self.event_id.clone(),
            scorecard_id: self.scorecard_id.clone(),
            hole: self.hole,
            strokes: self.strokes,
            putts: self.putts,
            revision: self.revision,
            fingerprint: self.fingerprint.clone(),
        }
    }

    /// Returns a copy carrying the bumped revision and a fresh
    /// fingerprint; attempts and scheduling are untouched.
    pub(crate) fn with_bumped_revision(&self, revision: u64, salt: FingerprintSalt) -> Self {
        let mut bumped = self.clone();
        bumped.revision = revision;
        bumped.fingerprint = Fingerprint::derive(
            salt,
            &bumped.scorecard_id,
            bumped.hole,
            bumped.strokes,
            bumped.putts,
            revision,
        );
        bumped
    }
}
