//! Reaction overlay - this client's optimistic like/unlike state
//!
//! The overlay remembers whether *this* client has reacted to a message and which
//! request is in flight. It never computes a count: counts come from the server
//! and are written into the [`MessageStore`].

use std::collections::HashMap;
use std::sync::Arc;

use ama_core::{MessageId, ReactionDirection, ReactionOutcome, SyncError, SyncResult};
use tracing::debug;

use crate::store::MessageStore;

/// Per-message overlay state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OverlayState {
    /// Whether the last confirmed request from this client was an add
    pub has_reacted_locally: bool,
    /// Direction of the request in flight, if any
    pub pending: Option<ReactionDirection>,
    /// Server count once this client's request was confirmed, kept current by live updates
    pub last_confirmed_count: Option<u64>,
}

impl OverlayState {
    /// What the reaction button should show right now
    #[must_use]
    pub fn shows_reacted(&self) -> bool {
        match self.pending {
            Some(direction) => direction.is_add(),
            None => self.has_reacted_locally,
        }
    }

    #[inline]
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

/// Handle for one in-flight reaction request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReactionTicket {
    id: u64,
    message_id: MessageId,
    direction: ReactionDirection,
}

impl ReactionTicket {
    pub fn message_id(&self) -> &MessageId {
        &self.message_id
    }

    pub fn direction(&self) -> ReactionDirection {
        self.direction
    }
}

/// Optimistic reaction state for every message this client touched
#[derive(Debug, Default)]
pub struct ReactionOverlay {
    entries: Arc<HashMap<MessageId, OverlayState>>,
    in_flight: HashMap<MessageId, u64>,
    next_ticket: u64,
}

impl ReactionOverlay {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a reaction request
    ///
    /// At most one request per message may be in flight.
    pub fn begin_reaction(
        &mut self,
        message_id: &MessageId,
        direction: ReactionDirection,
    ) -> SyncResult<ReactionTicket> {
        if self.in_flight.contains_key(message_id) {
            debug!(message_id = %message_id, %direction, "Reaction already pending");
            return Err(SyncError::AlreadyPending(message_id.clone()));
        }

        self.next_ticket += 1;
        let ticket = ReactionTicket {
            id: self.next_ticket,
            message_id: message_id.clone(),
            direction,
        };
        self.in_flight.insert(message_id.clone(), ticket.id);
        Arc::make_mut(&mut self.entries)
            .entry(message_id.clone())
            .or_default()
            .pending = Some(direction);

        Ok(ticket)
    }

    /// Settle a request with the server's answer
    ///
    /// A confirmed count is written to the store. Returns whether the store changed.
    pub fn resolve_reaction(
        &mut self,
        ticket: &ReactionTicket,
        outcome: ReactionOutcome,
        store: &mut MessageStore,
    ) -> SyncResult<bool> {
        if self.in_flight.get(&ticket.message_id) != Some(&ticket.id) {
            debug!(message_id = %ticket.message_id, "Stale reaction ticket");
            return Err(SyncError::UnknownTicket);
        }
        self.in_flight.remove(&ticket.message_id);

        let entry = Arc::make_mut(&mut self.entries)
            .entry(ticket.message_id.clone())
            .or_default();
        entry.pending = None;

        match outcome {
            ReactionOutcome::Confirmed(count) => {
                entry.has_reacted_locally = ticket.direction.is_add();
                entry.last_confirmed_count = Some(count);
                // The overlay is settled either way; an unknown message was already logged.
                Ok(store
                    .patch_reaction_count(&ticket.message_id, count)
                    .unwrap_or(false))
            }
            ReactionOutcome::Failed => Ok(false),
        }
    }

    /// Track a server count for a message this client has a confirmed reaction on
    ///
    /// Returns whether the overlay changed.
    pub fn observe_count(&mut self, message_id: &MessageId, count: u64) -> bool {
        let tracked = self
            .entries
            .get(message_id)
            .and_then(|state| state.last_confirmed_count);
        if tracked.is_none() || tracked == Some(count) {
            return false;
        }
        if let Some(entry) = Arc::make_mut(&mut self.entries).get_mut(message_id) {
            entry.last_confirmed_count = Some(count);
        }
        true
    }

    /// Overlay state of one message
    pub fn state(&self, message_id: &MessageId) -> OverlayState {
        self.entries.get(message_id).copied().unwrap_or_default()
    }

    pub fn is_pending(&self, message_id: &MessageId) -> bool {
        self.in_flight.contains_key(message_id)
    }

    /// Direction a like/unlike toggle would send
    pub fn toggle_direction(&self, message_id: &MessageId) -> ReactionDirection {
        if self.state(message_id).shows_reacted() {
            ReactionDirection::Remove
        } else {
            ReactionDirection::Add
        }
    }

    pub fn pending_count(&self) -> usize {
        self.in_flight.len()
    }

    /// Current overlay, copy-on-write like the store snapshot
    #[must_use]
    pub fn snapshot(&self) -> Arc<HashMap<MessageId, OverlayState>> {
        Arc::clone(&self.entries)
    }
}
