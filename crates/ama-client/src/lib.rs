//! # ama-client
//!
//! Network adapters for the AMA server:
//!
//! - [`HttpRoomApi`]: REST endpoints over reqwest, implements [`ama_core::RoomApi`]
//! - [`WsTransport`]: room subscription over tokio-tungstenite, implements
//!   [`ama_core::EventTransport`]
//!
//! [`connect`] wires both into a running [`ama_sync::RoomSession`].

pub mod dto;
pub mod error;
pub mod http;
pub mod ws;

use std::sync::Arc;

use ama_common::ClientConfig;
use ama_core::RoomId;
use ama_sync::{RoomSession, SessionConfig};

pub use error::{ApiError, ApiResult};
pub use http::HttpRoomApi;
pub use ws::{WsEventStream, WsTransport};

/// Open a session for a room against the configured server
///
/// The session starts its live channel immediately; call `load` for the bulk read.
pub fn connect(config: &ClientConfig, room_id: RoomId) -> ApiResult<RoomSession> {
    let api = HttpRoomApi::new(&config.api)?;
    let transport = WsTransport::new(&config.live.ws_url)?;

    Ok(RoomSession::open(
        room_id,
        Arc::new(api),
        Arc::new(transport),
        SessionConfig::from(&config.live),
    ))
}
