//! Ports - what the synchronizer needs from the network
//!
//! The domain layer defines the interface; `ama-client` provides the reqwest and
//! tokio-tungstenite implementations, tests provide in-memory fakes.

use async_trait::async_trait;

use crate::entities::{Message, ReactionDirection};
use crate::error::SyncError;
use crate::value_objects::{MessageId, RoomId};

/// Result type for API operations
pub type ApiResult<T> = Result<T, SyncError>;

// ============================================================================
// Room API (request/response)
// ============================================================================

#[async_trait]
pub trait RoomApi: Send + Sync {
    /// Bulk read: every message of the room, in server order
    async fn fetch_messages(&self, room_id: &RoomId) -> ApiResult<Vec<Message>>;

    /// Add this client's reaction; returns the confirmed absolute count
    async fn add_reaction(&self, room_id: &RoomId, message_id: &MessageId) -> ApiResult<u64>;

    /// Remove this client's reaction; returns the confirmed absolute count
    async fn remove_reaction(&self, room_id: &RoomId, message_id: &MessageId) -> ApiResult<u64>;

    /// Send a reaction request in the given direction
    async fn react(
        &self,
        room_id: &RoomId,
        message_id: &MessageId,
        direction: ReactionDirection,
    ) -> ApiResult<u64> {
        match direction {
            ReactionDirection::Add => self.add_reaction(room_id, message_id).await,
            ReactionDirection::Remove => self.remove_reaction(room_id, message_id).await,
        }
    }
}

// ============================================================================
// Live event transport (push stream)
// ============================================================================

#[async_trait]
pub trait EventTransport: Send + Sync {
    /// Open a subscription to the room's push stream
    async fn connect(&self, room_id: &RoomId) -> Result<Box<dyn EventStream>, SyncError>;
}

/// An open subscription yielding raw text frames
#[async_trait]
pub trait EventStream: Send {
    /// Next frame. `None` once the server closed the stream.
    async fn next_frame(&mut self) -> Option<Result<String, SyncError>>;

    /// Close the subscription
    async fn close(&mut self);
}
