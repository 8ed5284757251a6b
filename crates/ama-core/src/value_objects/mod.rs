//! Value objects

mod ids;
mod reaction_count;

pub use ids::{MessageId, RoomId};
pub use reaction_count::ReactionCount;
