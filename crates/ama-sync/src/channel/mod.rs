//! Live event channel
//!
//! - `state`: connection state machine
//! - `protocol`: wire envelope and event decoding
//! - `backoff`: reconnect delays
//! - `live_channel`: the managed subscription task

mod backoff;
mod live_channel;
pub mod protocol;
mod state;

pub use backoff::ReconnectPolicy;
pub use live_channel::{ChannelConfig, ChannelNotice, LiveEventChannel};
pub use protocol::{decode_frame, Decoded, EventEnvelope, EventKind};
pub use state::ChannelState;
