//! Test fixtures and data generators
//!
//! Provides reusable rooms and frames for integration tests.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::mock::MockState;

/// Counter for unique test data
static COUNTER: AtomicU64 = AtomicU64::new(1);

/// Get a unique suffix for test data
pub fn unique_suffix() -> u64 {
    COUNTER.fetch_add(1, Ordering::SeqCst)
}

pub fn unique_theme() -> String {
    format!("Test AMA {}", unique_suffix())
}

/// A room already holding some questions
pub struct SeededRoom {
    pub room_id: String,
    pub message_ids: Vec<String>,
}

impl SeededRoom {
    pub fn create(state: &MockState, questions: &[&str]) -> Self {
        let room_id = state.create_room(&unique_theme());
        let message_ids = questions
            .iter()
            .filter_map(|text| state.insert_silently(&room_id, text))
            .collect();
        Self {
            room_id,
            message_ids,
        }
    }
}

/// Frames the client must skip without dropping the connection
pub const GARBAGE_FRAMES: &[&str] = &[
    "not json at all",
    r#"{"kind":"room_renamed","value":{"theme":"new"}}"#,
    r#"{"kind":"message_created","value":{"id":42}}"#,
    r#"{"value":{}}"#,
];
