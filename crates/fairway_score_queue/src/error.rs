//! Error types for the score queue.

use thiserror::Error;

/// Result type for queue operations.
pub type QueueResult<T> = Result<T, QueueError>;

/// Errors surfaced by queue operations.
///
/// Dispatch failures never appear here: `flush` absorbs them into item
/// state and telemetry. Only a contract defect raises.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueueError {
    /// The caller handed `enqueue` a malformed mutation.
    #[error("invalid score mutation: {reason}")]
    InvalidMutation {
        /// What was wrong with the mutation.
        reason: String,
    },

    /// `flush` was entered while a previous flush was still in flight.
    #[error("flush already in progress")]
    FlushInProgress,
}

impl QueueError {
    /// Creates an invalid-mutation error.
    pub fn invalid_mutation(reason: impl Into<String>) -> Self {
        Self::InvalidMutation {
            reason: reason.into(),
        }
    }
}

/// Errors raised by a transport when the score mutation call itself fails.
///
/// Distinct from the server answering with a failure result: the dispatch
/// loop routes these to the backoff path.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The request never completed (offline, DNS, connection reset).
    #[error("network error: {0}")]
    Network(String),

    /// The request timed out.
    #[error("request timed out")]
    Timeout,

    /// Request or response bytes could not be encoded or decoded.
    #[error("codec error: {0}")]
    Codec(String),
}

impl TransportError {
    /// Creates a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    /// Creates a codec error.
    pub fn codec(message: impl Into<String>) -> Self {
        Self::Codec(message.into())
    }

    /// Returns true if the failure looks like lost connectivity rather
    /// than a protocol problem.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, TransportError::Network(_) | TransportError::Timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connectivity_classification() {
        assert!(TransportError::network("connection reset").is_connectivity());
        assert!(TransportError::Timeout.is_connectivity());
        assert!(!TransportError::codec("bad body").is_connectivity());
    }

    #[test]
    fn error_display() {
        let err = QueueError::invalid_mutation("hole must be 1 or greater");
        assert_eq!(
            err.to_string(),
            "invalid score mutation: hole must be 1 or greater"
        );

        assert_eq!(
            QueueError::FlushInProgress.to_string(),
            "flush already in progress"
        );

        assert_eq!(TransportError::Timeout.to_string(), "request timed out");
    }
}
