//! Response bodies

use ama_core::{Message, MessageId, ReactionCount};
use serde::{Deserialize, Serialize};

/// `{id}` returned by the create endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedResponse {
    pub id: String,
}

/// One entry of `GET /rooms/{room_id}/messages`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomMessageResponse {
    pub id: String,
    #[serde(default)]
    pub room_id: Option<String>,
    pub message: String,
    #[serde(default)]
    pub reaction_count: ReactionCount,
    #[serde(default)]
    pub answered: bool,
}

/// `PATCH|DELETE /rooms/{room_id}/messages/{message_id}/react`
///
/// The reference server sends the count as a string.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReactionCountResponse {
    pub reaction_count: ReactionCount,
}

impl From<RoomMessageResponse> for Message {
    fn from(dto: RoomMessageResponse) -> Self {
        Self {
            id: MessageId::from(dto.id),
            text: dto.message,
            answered: dto.answered,
            reaction_count: dto.reaction_count.get(),
        }
    }
}
