//! Live channel wire protocol
//!
//! Every frame is a JSON object `{"kind": "...", "value": {...}}`. Known kinds are
//! normalized into [`RoomEvent`]; anything else is reported as unrecognized.

use ama_core::{Message, MessageId, ReactionCount, RoomEvent, SyncError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Event kinds sent in the `kind` field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// New message posted
    MessageCreated,
    /// Message marked as answered by the room owner
    MessageAnswered,
    /// Someone reacted
    MessageReactionIncreased,
    /// Someone withdrew a reaction
    MessageReactionDecreased,
}

impl EventKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MessageCreated => "message_created",
            Self::MessageAnswered => "message_answered",
            Self::MessageReactionIncreased => "message_reaction_increased",
            Self::MessageReactionDecreased => "message_reaction_decreased",
        }
    }

    #[must_use]
    pub fn parse(kind: &str) -> Option<Self> {
        match kind {
            "message_created" => Some(Self::MessageCreated),
            "message_answered" => Some(Self::MessageAnswered),
            "message_reaction_increased" => Some(Self::MessageReactionIncreased),
            "message_reaction_decreased" => Some(Self::MessageReactionDecreased),
            _ => None,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw frame envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub kind: String,
    #[serde(default)]
    pub value: Value,
}

impl EventEnvelope {
    /// Build an envelope for a known kind
    pub fn new(kind: EventKind, value: Value) -> Self {
        Self {
            kind: kind.as_str().to_string(),
            value,
        }
    }
}

#[derive(Debug, Deserialize)]
struct MessageCreatedValue {
    id: String,
    message: String,
    #[serde(default)]
    reaction_count: ReactionCount,
    #[serde(default)]
    answered: bool,
}

#[derive(Debug, Deserialize)]
struct MessageAnsweredValue {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ReactionCountValue {
    id: String,
    count: ReactionCount,
}

/// Result of decoding one frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
    Event(RoomEvent),
    /// Well-formed frame of a kind this client does not handle
    Unrecognized(String),
}

/// Decode a text frame
///
/// Malformed JSON, and malformed values of known kinds, are `Decode` errors.
pub fn decode_frame(text: &str) -> Result<Decoded, SyncError> {
    let envelope: EventEnvelope =
        serde_json::from_str(text).map_err(|e| SyncError::decode(e.to_string()))?;

    let Some(kind) = EventKind::parse(&envelope.kind) else {
        return Ok(Decoded::Unrecognized(envelope.kind));
    };

    let event = match kind {
        EventKind::MessageCreated => {
            let value: MessageCreatedValue = from_value(kind, envelope.value)?;
            RoomEvent::MessageCreated(Message {
                id: MessageId::from(value.id),
                text: value.message,
                answered: value.answered,
                reaction_count: value.reaction_count.get(),
            })
        }
        EventKind::MessageAnswered => {
            let value: MessageAnsweredValue = from_value(kind, envelope.value)?;
            RoomEvent::MessageAnswered {
                id: MessageId::from(value.id),
            }
        }
        EventKind::MessageReactionIncreased | EventKind::MessageReactionDecreased => {
            let value: ReactionCountValue = from_value(kind, envelope.value)?;
            RoomEvent::ReactionCountChanged {
                id: MessageId::from(value.id),
                count: value.count.get(),
            }
        }
    };

    Ok(Decoded::Event(event))
}

fn from_value<T: serde::de::DeserializeOwned>(kind: EventKind, value: Value) -> Result<T, SyncError> {
    serde_json::from_value(value).map_err(|e| SyncError::decode(format!("{kind}: {e}")))
}
