//! Message store - the ordered, de-duplicated messages of one room
//!
//! Insertion order is first-observed order: bulk read order for seeded entries,
//! arrival order for everything learned from the live channel. Snapshots are
//! copy-on-write, so a reader holding one never sees it change.

use std::collections::HashMap;
use std::sync::Arc;

use ama_core::{Message, MessageId, SyncError, SyncResult};
use tracing::{debug, warn};

/// Whether an incoming record may overwrite the stored reaction count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountAuthority {
    /// The record comes from a bulk read and its count is current
    Authoritative,
    /// Keep the stored count; only merge the other fields
    ///
    /// A new message is still inserted with its own count.
    Preserve,
}

/// Ordered collection of the room's messages
#[derive(Debug, Default)]
pub struct MessageStore {
    messages: Arc<Vec<Message>>,
    index: HashMap<MessageId, usize>,
    seeded: bool,
}

impl MessageStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply the bulk read
    ///
    /// Only the first call has an effect. Messages that arrived live before the
    /// seed survive it: bulk entries lead in bulk order, the live-only entries follow
    /// in the order they arrived. An id present in both keeps its bulk position.
    pub fn seed(&mut self, bulk: Vec<Message>) -> bool {
        if self.seeded {
            debug!(count = bulk.len(), "Store already seeded, ignoring bulk read");
            return false;
        }
        self.seeded = true;

        let early = std::mem::take(Arc::make_mut(&mut self.messages));
        self.index.clear();

        let bulk_len = bulk.len();
        for message in bulk {
            self.merge_or_append(message, CountAuthority::Authoritative);
        }
        for message in early {
            self.merge_or_append(message, CountAuthority::Preserve);
        }

        debug!(
            bulk = bulk_len,
            total = self.messages.len(),
            "Store seeded"
        );
        true
    }

    /// Insert a new message or merge into the existing one
    ///
    /// Returns whether anything visible changed.
    pub fn upsert(&mut self, message: Message, authority: CountAuthority) -> bool {
        self.merge_or_append(message, authority)
    }

    /// Replace the reaction count of a known message
    pub fn patch_reaction_count(&mut self, id: &MessageId, count: u64) -> SyncResult<bool> {
        let pos = self.position(id)?;
        if self.messages[pos].reaction_count == count {
            return Ok(false);
        }
        Arc::make_mut(&mut self.messages)[pos].reaction_count = count;
        Ok(true)
    }

    /// Flag a known message as answered
    pub fn mark_answered(&mut self, id: &MessageId) -> SyncResult<bool> {
        let pos = self.position(id)?;
        if self.messages[pos].answered {
            return Ok(false);
        }
        Arc::make_mut(&mut self.messages)[pos].answered = true;
        Ok(true)
    }

    /// Current contents
    ///
    /// Returns the same `Arc` until the next visible change.
    #[must_use]
    pub fn snapshot(&self) -> Arc<Vec<Message>> {
        Arc::clone(&self.messages)
    }

    pub fn get(&self, id: &MessageId) -> Option<&Message> {
        self.index.get(id).map(|&pos| &self.messages[pos])
    }

    pub fn contains(&self, id: &MessageId) -> bool {
        self.index.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn is_seeded(&self) -> bool {
        self.seeded
    }

    fn position(&self, id: &MessageId) -> SyncResult<usize> {
        match self.index.get(id) {
            Some(&pos) => Ok(pos),
            None => {
                warn!(message_id = %id, "Partial update for unknown message");
                Err(SyncError::UnknownMessage(id.clone()))
            }
        }
    }

    fn merge_or_append(&mut self, incoming: Message, authority: CountAuthority) -> bool {
        let Some(pos) = self.index.get(&incoming.id).copied() else {
            self.index.insert(incoming.id.clone(), self.messages.len());
            Arc::make_mut(&mut self.messages).push(incoming);
            return true;
        };

        let existing = &self.messages[pos];
        if existing.text != incoming.text {
            debug!(message_id = %incoming.id, "Ignoring text change on existing message");
        }

        // answered never reverts
        let answered = existing.answered || incoming.answered;
        let reaction_count = match authority {
            CountAuthority::Authoritative => incoming.reaction_count,
            CountAuthority::Preserve => existing.reaction_count,
        };
        if answered == existing.answered && reaction_count == existing.reaction_count {
            return false;
        }

        let slot = &mut Arc::make_mut(&mut self.messages)[pos];
        slot.answered = answered;
        slot.reaction_count = reaction_count;
        true
    }
}
