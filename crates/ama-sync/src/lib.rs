//! # ama-sync
//!
//! Room state synchronizer. Reconciles the one-shot bulk read, the live event feed
//! and this client's optimistic reactions into a single de-duplicated room view.
//!
//! ## Modules
//!
//! - `store`: ordered, de-duplicated messages of one room
//! - `overlay`: per-message optimistic reaction state
//! - `channel`: managed live subscription with reconnect
//! - `session`: the actor that owns store and overlay, and its handle

pub mod channel;
pub mod overlay;
pub mod session;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use channel::{ChannelConfig, ChannelNotice, ChannelState, LiveEventChannel, ReconnectPolicy};
pub use overlay::{OverlayState, ReactionOverlay, ReactionTicket};
pub use session::{
    ReactionReceipt, RoomSession, RoomView, SessionConfig, SessionNotice, SessionNoticeKind,
};
pub use store::{CountAuthority, MessageStore};
