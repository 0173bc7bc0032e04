//! In-memory item storage.

use crate::item::{ItemId, QueueItem, ScoreMutationRequest};
use fairway_score_protocol::{Fingerprint, FingerprintSalt};

/// Holds pending items and allocates their ids.
///
/// The store is plain data; the queue serializes access to it. Items keep
/// insertion order, which is also dispatch order.
#[derive(Debug)]
pub(crate) struct ItemStore {
    salt: FingerprintSalt,
    next_id: u64,
    items: Vec<QueueItem>,
}

impl ItemStore {
    pub(crate) fn new(salt: FingerprintSalt) -> Self {
        Self {
            salt,
            next_id: 1,
            items: Vec::new(),
        }
    }

    pub(crate) fn salt(&self) -> FingerprintSalt {
        self.salt
    }

    /// Swaps the fingerprint salt. Items already queued keep the
    /// fingerprints they were enqueued with.
    pub(crate) fn set_salt(&mut self, salt: FingerprintSalt) {
        self.salt = salt;
    }

    /// Materializes a request into a stored item and returns a copy.
    pub(crate) fn insert(&mut self, request: &ScoreMutationRequest) -> QueueItem {
        let revision = request.effective_revision();
        let id = ItemId::new(self.next_id);
        self.next_id += 1;

        let fingerprint = Fingerprint::derive(
            self.salt,
            &request.scorecard_id,
            request.hole,
            request.strokes,
            request.putts,
            revision,
        );

        let item = QueueItem {
            id,
            event_id: request.event_id.clone(),
            scorecard_id: request.scorecard_id.clone(),
            hole: request.hole,
            strokes: request.strokes,
            putts: request.putts,
            revision,
            fingerprint,
            attempts: 0,
            stuck: false,
            next_at_ms: None,
        };
        self.items.push(item.clone());
        item
    }

    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub(crate) fn items(&self) -> Vec<QueueItem> {
        self.items.clone()
    }

    pub(crate) fn due_items(&self, now_ms: u64) -> Vec<QueueItem> {
        self.items
            .iter()
            .filter(|item| item.is_due(now_ms))
            .cloned()
            .collect()
    }

    /// Removes the item with the given id; false if it was already gone.
    pub(crate) fn remove(&mut self, id: ItemId) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.id != id);
        self.items.len() != before
    }

    /// Replaces the stored item with the same id; false if it was
    /// already gone.
    pub(crate) fn replace(&mut self, updated: QueueItem) -> bool {
        match self.items.iter_mut().find(|item| item.id == updated.id) {
            Some(slot) => {
                *slot = updated;
                true
            }
            None => false,
        }
    }

    pub(crate) fn clear(&mut self) {
        self.items.clear();
    }
}
