//! Ports implemented by infrastructure crates

mod ports;

pub use ports::{ApiResult, EventStream, EventTransport, RoomApi};
