//! Idempotency fingerprints for score mutations.

use sha2::{Digest, Sha256};
use std::fmt;

/// A per-queue salt mixed into every fingerprint.
///
/// The salt is drawn once from the queue's randomness source at
/// construction, so that within one queue instance a fingerprint is a
/// deterministic function of the mutation's identity and revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FingerprintSalt(u64);

impl FingerprintSalt {
    /// Creates a salt from a random draw in `[0, 1)`.
    pub fn from_unit(value: f64) -> Self {
        Self(value.to_bits())
    }

    /// Creates a salt from raw bits.
    pub fn from_bits(bits: u64) -> Self {
        Self(bits)
    }

    /// Returns the raw salt bits.
    pub fn bits(&self) -> u64 {
        self.0
    }
}

/// An idempotency token for one attempted write at one revision.
///
/// Distinct from the revision: the server uses it to deduplicate a retried
/// request for the same logical write without conflating two different
/// attempted writes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Derives the fingerprint for a score mutation at a given revision.
    ///
    /// The digest covers the salt plus the mutation's identity, so equal
    /// identity and revision always produce the same fingerprint on one
    /// queue, and any revision change produces a different one.
    pub fn derive(
        salt: FingerprintSalt,
        scorecard_id: &str,
        hole: u32,
        strokes: u32,
        putts: Option<u32>,
        revision: u64,
    ) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(salt.bits().to_be_bytes());
        hasher.update((scorecard_id.len() as u64).to_be_bytes());
        hasher.update(scorecard_id.as_bytes());
        hasher.update(hole.to_be_bytes());
        hasher.update(strokes.to_be_bytes());
        // None and Some(0) must hash differently
        hasher.update(putts.map_or(-1i64, i64::from).to_be_bytes());
        hasher.update(revision.to_be_bytes());
        let digest = hasher.finalize();

        use std::fmt::Write as _;
        let mut hex = String::with_capacity(32);
        for byte in &digest[..16] {
            let _ = write!(hex, "{byte:02x}");
        }
        Self(hex)
    }

    /// Creates a fingerprint from an existing token string.
    ///
    /// Intended for callers restoring persisted queue snapshots.
    pub fn from_token(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the fingerprint as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
