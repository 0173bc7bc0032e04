//! Protocol messages for score mutations.

use crate::fingerprint::Fingerprint;
use serde::{Deserialize, Serialize};

/// Outbound payload for a score mutation.
///
/// This is the shape handed to the transport; the queue is the sole
/// authority for the revision and fingerprint that go on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostScoreArgs {
    /// Caller-defined correlation id for the event being scored.
    pub event_id: String,
    /// Scorecard the mutation applies to.
    pub scorecard_id: String,
    /// Hole number, 1-based.
    pub hole: u32,
    /// Stroke count for the hole.
    pub strokes: u32,
    /// Putt count for the hole, when recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub putts: Option<u32>,
    /// Client revision of the scorecard this write is based on.
    pub revision: u64,
    /// Idempotency token for this write at this revision.
    pub fingerprint: Fingerprint,
}

/// Outcome of a score mutation.
///
/// The wire shape is a loose JSON object with optional fields; this enum
/// makes each branch's required fields explicit. Transport-level failures
/// (the call itself failing) are not a variant here, they travel on the
/// `Err` channel of the transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "WirePostScoreResult", into = "WirePostScoreResult")]
pub enum PostScoreResult {
    /// The server accepted the write at the given revision.
    Success {
        /// Revision the server recorded for the write.
        revision: u64,
    },
    /// The server recognized the fingerprint as already applied.
    IdempotentSuccess {
        /// Revision the server holds for the already-applied write.
        revision: u64,
    },
    /// The client's revision is stale or duplicate; bump and retry once.
    ConflictRetryable {
        /// The server's authoritative revision to bump from.
        current_revision: u64,
        /// Server-supplied rejection reason.
        reason: String,
        /// HTTP status of the rejection, when known.
        status: Option<u16>,
    },
    /// Any other rejection, including a failed conflict retry.
    OtherFailure {
        /// HTTP status of the rejection, when known.
        status: Option<u16>,
    },
}

impl PostScoreResult {
    /// Creates a plain success result.
    pub fn success(revision: u64) -> Self {
        Self::Success { revision }
    }

    /// Creates an idempotent-replay success result.
    pub fn idempotent(revision: u64) -> Self {
        Self::IdempotentSuccess { revision }
    }

    /// Creates the stale-or-duplicate conflict the score service sends.
    pub fn stale(current_revision: u64) -> Self {
        Self::ConflictRetryable {
            current_revision,
            reason: "STALE_OR_DUPLICATE".into(),
            status: Some(409),
        }
    }

    /// Creates a non-retryable failure result.
    pub fn failure(status: Option<u16>) -> Self {
        Self::OtherFailure { status }
    }

    /// Returns true for either success variant.
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            PostScoreResult::Success { .. } | PostScoreResult::IdempotentSuccess { .. }
        )
    }

    /// Returns true if the server deduplicated the write by fingerprint.
    pub fn is_idempotent(&self) -> bool {
        matches!(self, PostScoreResult::IdempotentSuccess { .. })
    }
}

/// The loose JSON shape spoken by the score service.
///
/// Decoding is tolerant: absent fields default, unknown fields are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WirePostScoreResult {
    ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    revision: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    idempotent: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    retry: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    current_revision: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    status: Option<u16>,
}

impl From<WirePostScoreResult> for PostScoreResult {
    fn from(wire: WirePostScoreResult) -> Self {
        if wire.ok {
            let revision = wire.revision.unwrap_or(0);
            return if wire.idempotent == Some(true) {
                PostScoreResult::IdempotentSuccess { revision }
            } else {
                PostScoreResult::Success { revision }
            };
        }

        // A conflict is only retryable with a numeric authoritative revision
        if let (Some("bump"), Some(current_revision)) =
            (wire.retry.as_deref(), wire.current_revision)
        {
            return PostScoreResult::ConflictRetryable {
                current_revision,
                reason: wire.reason.unwrap_or_default(),
                status: wire.status,
            };
        }

        PostScoreResult::OtherFailure {
            status: wire.status,
        }
    }
}

impl From<PostScoreResult> for WirePostScoreResult {
    fn from(result: PostScoreResult) -> Self {
        match result {
            PostScoreResult::Success { revision } => WirePostScoreResult {
                ok: true,
                revision: Some(revision),
                idempotent: None,
                retry: None,
                current_revision: None,
                reason: None,
                status: None,
            },
            PostScoreResult::IdempotentSuccess { revision } => WirePostScoreResult {
                ok: true,
                revision: Some(revision),
                idempotent: Some(true),
                retry: None,
                current_revision: None,
                reason: None,
                status: None,
            },
            PostScoreResult::ConflictRetryable {
                current_revision,
                reason,
                status,
            } => WirePostScoreResult {
                ok: false,
                revision: None,
                idempotent: None,
                retry: Some("bump".into()),
                current_revision: Some(current_revision),
                reason: Some(reason),
                status,
            },
            PostScoreResult::OtherFailure { status } => WirePostScoreResult {
                ok: false,
                revision: None,
                idempotent: None,
                retry: None,
                current_revision: None,
                reason: None,
                status,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingerprint::FingerprintSalt;
    use serde_json::json;

    #[test]
    fn args_serialize_as_camel_case() {
        let args = PostScoreArgs {
            event_id: "evt-1".into(),
            scorecard_id: "card-1".into(),
            hole: 3,
            strokes: 4,
            putts: Some(2),
            revision: 1,
            fingerprint: Fingerprint::derive(
                FingerprintSalt::from_bits(0),
                "card-1",
                3,
                4,
                Some(2),
                1,
            ),
        };

        let value = serde_json::to_value(&args).unwrap();
        assert_eq!(value["eventId"], "evt-1");
        assert_eq!(value["scorecardId"], "card-1");
        assert_eq!(value["revision"], 1);
        assert!(value["fingerprint"].is_string());
    }

    #[test]
    fn args_omit_missing_putts() {
        let args = PostScoreArgs {
            event_id: "evt-1".into(),
            scorecard_id: "card-1".into(),
            hole: 3,
            strokes: 4,
            putts: None,
            revision: 1,
            fingerprint: Fingerprint::from_token("fp"),
        };

        let value = serde_json::to_value(&args).unwrap();
        assert!(value.get("putts").is_none());
    }

    #[test]
    fn success_wire_shape() {
        let value = serde_json::to_value(PostScoreResult::success(2)).unwrap();
        assert_eq!(value, json!({"ok": true, "revision": 2}));
    }

    #[test]
    fn idempotent_success_decodes() {
        let result: PostScoreResult =
            serde_json::from_value(json!({"ok": true, "idempotent": true, "revision": 5})).unwrap();
        assert_eq!(result, PostScoreResult::idempotent(5));
        assert!(result.is_success());
        assert!(result.is_idempotent());
    }

    #[test]
    fn conflict_decodes_with_authoritative_revision() {
        let result: PostScoreResult = serde_json::from_value(json!({
            "ok": false,
            "retry": "bump",
            "currentRevision": 2,
            "reason": "STALE_OR_DUPLICATE",
            "status": 409,
        }))
        .unwrap();

        assert_eq!(result, PostScoreResult::stale(2));
        assert!(!result.is_success());
    }

    #[test]
    fn conflict_without_revision_is_other_failure() {
        let result: PostScoreResult =
            serde_json::from_value(json!({"ok": false, "retry": "bump", "status": 409})).unwrap();
        assert_eq!(result, PostScoreResult::failure(Some(409)));
    }

    #[test]
    fn failure_without_status_serializes_minimal() {
        let value = serde_json::to_value(PostScoreResult::failure(None)).unwrap();
        assert_eq!(value, json!({"ok": false}));
    }

    #[test]
    fn unknown_wire_fields_are_ignored() {
        let result: PostScoreResult = serde_json::from_value(json!({
            "ok": true,
            "revision": 3,
            "serverTimeMs": 1234,
        }))
        .unwrap();
        assert_eq!(result, PostScoreResult::success(3));
    }
}
