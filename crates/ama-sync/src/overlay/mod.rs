//! Reaction overlay

mod reaction_overlay;

pub use reaction_overlay::{OverlayState, ReactionOverlay, ReactionTicket};
