//! # ama-core
//!
//! Domain layer for an AMA room: messages, reaction types, room events, sync errors,
//! and the ports (traits) the synchronizer needs from the outside world.
//! This crate has zero dependencies on infrastructure (HTTP client, websocket, etc.).

pub mod entities;
pub mod error;
pub mod events;
pub mod traits;
pub mod value_objects;

// Re-export commonly used types at crate root
pub use entities::{Message, ReactionDirection, ReactionOutcome};
pub use error::{SyncError, SyncResult};
pub use events::RoomEvent;
pub use traits::{ApiResult, EventStream, EventTransport, RoomApi};
pub use value_objects::{MessageId, ReactionCount, RoomId};
