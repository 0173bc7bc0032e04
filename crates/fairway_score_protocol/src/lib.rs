//! # Fairway Score Protocol
//!
//! Score mutation protocol types and JSON wire codec for Fairway.
//!
//! This crate provides:
//! - Outbound score mutation payloads (`PostScoreArgs`)
//! - Tagged score mutation outcomes (`PostScoreResult`)
//! - Idempotency fingerprint derivation (`Fingerprint`, `FingerprintSalt`)
//!
//! ## Architecture
//!
//! The protocol implements **optimistic concurrency control** for hole
//! scores:
//! 1. The client posts a score carrying a revision number and a fingerprint
//! 2. The server accepts the write, recognizes the fingerprint as already
//!    applied, or rejects the write with its authoritative revision
//! 3. The client bumps to the authoritative revision, derives a fresh
//!    fingerprint, and retries exactly once
//!
//! The wire format is the camelCase JSON shape spoken by the score service;
//! decoding is tolerant of absent and unknown fields so older servers stay
//! compatible.
//!
//! This is a pure protocol crate with no I/O operations.
//!
//! ## Key Invariants
//!
//! - A fingerprint changes exactly when the revision changes
//! - A conflict without a numeric authoritative revision is not retryable
//! - Success and idempotent success are equivalent for removal, distinct
//!   for telemetry

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod fingerprint;
mod messages;

pub use fingerprint::{Fingerprint, FingerprintSalt};
pub use messages::{PostScoreArgs, PostScoreResult};
