//! What the rendering layer sees

use std::collections::HashMap;
use std::sync::Arc;

use ama_core::{Message, MessageId, ReactionDirection, SyncError};
use chrono::{DateTime, Utc};

use crate::channel::ChannelState;
use crate::overlay::OverlayState;

/// Immutable view of a room, cheap to clone
#[derive(Debug, Clone, Default)]
pub struct RoomView {
    pub messages: Arc<Vec<Message>>,
    pub reactions: Arc<HashMap<MessageId, OverlayState>>,
    pub connection: ChannelState,
    /// Whether the bulk read has been applied
    pub loaded: bool,
}

impl RoomView {
    pub fn message(&self, id: &MessageId) -> Option<&Message> {
        self.messages.iter().find(|m| &m.id == id)
    }

    pub fn reaction(&self, id: &MessageId) -> OverlayState {
        self.reactions.get(id).copied().unwrap_or_default()
    }

    /// Optimistic like state of a message for this client
    pub fn shows_reacted(&self, id: &MessageId) -> bool {
        self.reaction(id).shows_reacted()
    }

    pub fn ids(&self) -> Vec<&str> {
        self.messages.iter().map(|m| m.id.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Confirmed result of a reaction request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReactionReceipt {
    pub message_id: MessageId,
    pub direction: ReactionDirection,
    pub count: u64,
}

/// Something the user may want to be told about
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionNoticeKind {
    /// The bulk read failed; `load` can be retried
    LoadFailed(SyncError),
    /// A reaction request failed; the button reverted
    ReactionFailed {
        message_id: MessageId,
        error: SyncError,
    },
    /// Live updates are unavailable for now
    Degraded { attempts: u32 },
    /// Live updates are back
    Recovered { attempts: u32 },
}

/// Timestamped session notice
#[derive(Debug, Clone)]
pub struct SessionNotice {
    pub kind: SessionNoticeKind,
    pub at: DateTime<Utc>,
}

impl SessionNotice {
    pub(crate) fn now(kind: SessionNoticeKind) -> Self {
        Self {
            kind,
            at: Utc::now(),
        }
    }

    /// Short text for a toast
    #[must_use]
    pub fn message(&self) -> &'static str {
        match &self.kind {
            SessionNoticeKind::LoadFailed(_) => "Could not load the room, please try again",
            SessionNoticeKind::ReactionFailed { error, .. } if error.is_user_facing() => {
                "Could not update your reaction, please try again"
            }
            SessionNoticeKind::ReactionFailed { .. } => "Could not update your reaction",
            SessionNoticeKind::Degraded { .. } => {
                "Live updates are unavailable, the room may be out of date"
            }
            SessionNoticeKind::Recovered { .. } => "Live updates restored",
        }
    }

    /// Whether this is a degraded-mode notice rather than a transient one
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        matches!(self.kind, SessionNoticeKind::Degraded { .. })
    }
}
