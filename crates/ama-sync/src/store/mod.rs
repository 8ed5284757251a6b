//! Message store

mod message_store;

pub use message_store::{CountAuthority, MessageStore};
