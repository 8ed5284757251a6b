//! Request bodies
//!
//! Validated client-side before anything is sent.

use serde::Serialize;
use validator::Validate;

/// `POST /rooms`
#[derive(Debug, Clone, Serialize, Validate)]
pub struct CreateRoomRequest {
    #[validate(length(min = 1, max = 255, message = "Theme must be 1-255 characters"))]
    pub theme: String,
}

/// `POST /rooms/{room_id}/messages`
#[derive(Debug, Clone, Serialize, Validate)]
pub struct CreateMessageRequest {
    #[validate(length(min = 1, max = 2000, message = "Question must be 1-2000 characters"))]
    pub message: String,
}

impl CreateRoomRequest {
    pub fn new(theme: impl Into<String>) -> Self {
        Self {
            theme: theme.into().trim().to_string(),
        }
    }
}

impl CreateMessageRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into().trim().to_string(),
        }
    }
}
