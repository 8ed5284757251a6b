//! Integration test utilities for the AMA client
//!
//! This crate runs an in-memory AMA server and provides helpers for end-to-end
//! tests of the REST adapter, the websocket adapter and room sessions.

pub mod fixtures;
pub mod helpers;

pub use fixtures::*;
pub use helpers::*;
pub use mock::{MockState, StoredMessage};
