//! Room events - normalized state changes delivered by the live channel

use crate::entities::Message;
use crate::value_objects::MessageId;

/// A state change pushed by the server for one room
///
/// The set is closed: wire kinds the client does not know are dropped while decoding
/// and never reach the synchronizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomEvent {
    /// A new message was posted. Its count and answered flag are authoritative.
    MessageCreated(Message),
    /// A message was marked as answered
    MessageAnswered { id: MessageId },
    /// The absolute reaction count of a message changed
    ReactionCountChanged { id: MessageId, count: u64 },
}

impl RoomEvent {
    /// Id of the message this event is about
    pub fn message_id(&self) -> &MessageId {
        match self {
            Self::MessageCreated(message) => &message.id,
            Self::MessageAnswered { id } | Self::ReactionCountChanged { id, .. } => id,
        }
    }

    /// Short name for logs
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::MessageCreated(_) => "MessageCreated",
            Self::MessageAnswered { .. } => "MessageAnswered",
            Self::ReactionCountChanged { .. } => "ReactionCountChanged",
        }
    }
}
