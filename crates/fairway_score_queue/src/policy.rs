//! Dispatch outcome policy.
//!
//! Pure decision functions that map a transport outcome to what should
//! happen to the stored item. Keeping these free of locks and I/O makes
//! every branch of the conflict protocol directly testable.

use crate::config::BackoffPolicy;
use crate::error::TransportError;
use crate::item::QueueItem;
use fairway_score_protocol::{FingerprintSalt, PostScoreResult};

/// What to do with an item after its first post of a flush cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum FirstAttemptFate {
    /// The server accepted the write; drop the item.
    Remove {
        /// True if the server deduplicated the write by fingerprint.
        idempotent: bool,
    },
    /// The server reported a retryable conflict; post once more with the
    /// bumped revision.
    Redispatch {
        /// Item carrying the bumped revision and a fresh fingerprint.
        bumped: QueueItem,
        /// Revision the rejected post carried.
        prev_revision: u64,
    },
    /// The attempt failed for non-conflict reasons; keep the item and
    /// defer it.
    Reschedule {
        /// Item with updated attempts and scheduling.
        updated: QueueItem,
    },
}

/// What to do with an item after its single bumped retry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum BumpedRetryFate {
    /// The retry landed; drop the item.
    Remove {
        /// True if the server deduplicated the write by fingerprint.
        idempotent: bool,
    },
    /// The retry failed too; park the item until outside intervention.
    Stick {
        /// Item marked stuck, still carrying the bumped revision.
        stuck: QueueItem,
        /// The revision the failed retry carried.
        rev_tried: u64,
    },
}

/// Decides the fate of an item after its first post of the cycle.
///
/// Exactly one conflict is honored per cycle: a retryable conflict here
/// yields a redispatch, never another reschedule.
pub(crate) fn first_attempt_fate(
    item: &QueueItem,
    outcome: &Result<PostScoreResult, TransportError>,
    now_ms: u64,
    backoff: &BackoffPolicy,
    jitter_unit: f64,
    salt: FingerprintSalt,
) -> FirstAttemptFate {
    match outcome {
        Ok(PostScoreResult::Success { .. }) => FirstAttemptFate::Remove { idempotent: false },
        Ok(PostScoreResult::IdempotentSuccess { .. }) => {
            FirstAttemptFate::Remove { idempotent: true }
        }
        Ok(PostScoreResult::ConflictRetryable {
            current_revision, ..
        }) => FirstAttemptFate::Redispatch {
            bumped: item.with_bumped_revision(current_revision.saturating_add(1), salt),
            prev_revision: item.revision,
        },
        Ok(PostScoreResult::OtherFailure { .. }) | Err(_) => FirstAttemptFate::Reschedule {
            updated: rescheduled(item, now_ms, backoff, jitter_unit),
        },
    }
}

/// Decides the fate of an item after its single bumped retry.
///
/// Any non-success outcome, including a second conflict, parks the item.
pub(crate) fn bumped_retry_fate(
    bumped: &QueueItem,
    outcome: &Result<PostScoreResult, TransportError>,
    now_ms: u64,
) -> BumpedRetryFate {
    match outcome {
        Ok(PostScoreResult::Success { .. }) => BumpedRetryFate::Remove { idempotent: false },
        Ok(PostScoreResult::IdempotentSuccess { .. }) => {
            BumpedRetryFate::Remove { idempotent: true }
        }
        Ok(PostScoreResult::ConflictRetryable { .. })
        | Ok(PostScoreResult::OtherFailure { .. })
        | Err(_) => {
            let mut stuck = bumped.clone();
            stuck.attempts = stuck.attempts.saturating_add(1);
            stuck.stuck = true;
            stuck.next_at_ms = Some(now_ms);
            BumpedRetryFate::Stick {
                rev_tried: bumped.revision,
                stuck,
            }
        }
    }
}

/// Applies the backoff policy to a failed item.
fn rescheduled(
    item: &QueueItem,
    now_ms: u64,
    backoff: &BackoffPolicy,
    jitter_unit: f64,
) -> QueueItem {
    let mut updated = item.clone();
    updated.attempts = updated.attempts.saturating_add(1);

    if backoff
        .max_attempts
        .map_or(false, |cap| updated.attempts >= cap)
    {
        updated.stuck = true;
        updated.next_at_ms = Some(now_ms);
        return updated;
    }

    let delay = backoff
        .delay_for_attempt(updated.attempts)
        .saturating_add(backoff.jitter_for(jitter_unit));
    updated.next_at_ms = Some(now_ms.saturating_add(delay));
    updated
}
