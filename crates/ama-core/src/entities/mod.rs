//! Domain entities

mod message;
mod reaction;

pub use message::Message;
pub use reaction::{ReactionDirection, ReactionOutcome};
