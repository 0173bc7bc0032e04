//! Telemetry sinks and the queue's event vocabulary.

use parking_lot::Mutex;
use serde_json::Value;

/// Emitted once per item removed after a successful post.
pub const SCORE_FLUSHED: &str = "score.flushed";
/// Emitted when a conflict bumps an item's revision before the retry.
pub const SCORE_RETRY_BUMPED: &str = "score.retry_bumped";
/// Emitted when a bumped retry fails and the item sticks.
pub const SCORE_CONFLICT_UNRESOLVED: &str = "score.conflict_unresolved";

/// A sink for queue telemetry events.
///
/// Implementations must not panic; a telemetry failure must never affect
/// queue correctness.
pub trait TelemetrySink: Send + Sync {
    /// Records one event with its payload.
    fn emit(&self, event: &str, payload: Value);
}

/// Default sink forwarding events to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl TelemetrySink for TracingSink {
    fn emit(&self, event: &str, payload: Value) {
        tracing::info!(target: "telemetry", event, %payload);
    }
}

/// A sink that drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl TelemetrySink for NullSink {
    fn emit(&self, _event: &str, _payload: Value) {}
}

/// A sink that records events in memory for assertions.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<(String, Value)>>,
}

impl MemorySink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of every recorded event in emission order.
    pub fn events(&self) -> Vec<(String, Value)> {
        self.events.lock().clone()
    }

    /// Returns true if an event with this name and payload was recorded.
    pub fn contains(&self, event: &str, payload: &Value) -> bool {
        self.events
            .lock()
            .iter()
            .any(|(name, recorded)| name == event && recorded == payload)
    }
}

impl TelemetrySink for MemorySink {
    fn emit(&self, event: &str, payload: Value) {
        self.events.lock().push((event.to_string(), payload));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn memory_sink_records_in_order() {
        let sink = MemorySink::new();
        sink.emit(SCORE_RETRY_BUMPED, json!({"prevRev": 2, "newRev": 3}));
        sink.emit(SCORE_FLUSHED, json!({"count": 1, "idempotent": false}));

        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].0, SCORE_RETRY_BUMPED);
        assert!(sink.contains(SCORE_FLUSHED, &json!({"count": 1, "idempotent": false})));
        assert!(!sink.contains(SCORE_FLUSHED, &json!({"count": 1, "idempotent": true})));
    }

    #[test]
    fn null_and_tracing_sinks_accept_events() {
        NullSink.emit(SCORE_FLUSHED, json!({"count": 1}));
        TracingSink.emit(SCORE_CONFLICT_UNRESOLVED, json!({"hole": 9, "revTried": 5}));
    }
}
