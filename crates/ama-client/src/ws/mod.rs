//! Live channel transport

mod transport;

pub use transport::{WsEventStream, WsTransport};
