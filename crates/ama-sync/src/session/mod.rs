//! Room session
//!
//! [`RoomSession`] is the handle the application holds; the actor behind it owns the
//! message store, the reaction overlay and the live channel of one room.

mod actor;
mod room_session;
mod view;

pub use room_session::{RoomSession, SessionConfig};
pub use view::{ReactionReceipt, RoomView, SessionNotice, SessionNoticeKind};
