//! Sync errors - everything that can go wrong while keeping a room view in sync
//!
//! None of these are fatal: the room view degrades to stale-but-consistent.

use thiserror::Error;

use crate::value_objects::MessageId;

/// Synchronizer errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    // =========================================================================
    // Network
    // =========================================================================
    /// Bulk read or reaction request failed; safe to retry
    #[error("Network request failed: {0}")]
    TransientNetwork(String),

    /// Live channel dropped unexpectedly; reconnect is handled internally
    #[error("Live channel dropped: {0}")]
    ChannelDrop(String),

    /// Reconnect keeps failing
    #[error("Live channel degraded after {attempts} failed reconnect attempts")]
    ChannelDegraded { attempts: u32 },

    // =========================================================================
    // Local guards and anomalies
    // =========================================================================
    /// A reaction request for this message is already in flight
    #[error("Reaction already pending for message {0}")]
    AlreadyPending(MessageId),

    /// A partial update targeted a message that was never observed
    #[error("Unknown message: {0}")]
    UnknownMessage(MessageId),

    /// A reaction ticket did not match the in-flight request
    #[error("Reaction ticket does not match a pending request")]
    UnknownTicket,

    /// Payload could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),

    // =========================================================================
    // Lifecycle
    // =========================================================================
    /// The room session has been torn down
    #[error("Room session closed")]
    SessionClosed,
}

impl SyncError {
    /// Create a transient network error
    pub fn network(msg: impl Into<String>) -> Self {
        Self::TransientNetwork(msg.into())
    }

    /// Create a decode error
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Get an error code string for logs and notices
    pub fn code(&self) -> &'static str {
        match self {
            Self::TransientNetwork(_) => "TRANSIENT_NETWORK",
            Self::ChannelDrop(_) => "CHANNEL_DROP",
            Self::ChannelDegraded { .. } => "CHANNEL_DEGRADED",
            Self::AlreadyPending(_) => "ALREADY_PENDING",
            Self::UnknownMessage(_) => "UNKNOWN_MESSAGE",
            Self::UnknownTicket => "UNKNOWN_TICKET",
            Self::Decode(_) => "DECODE_ERROR",
            Self::SessionClosed => "SESSION_CLOSED",
        }
    }

    /// Check if retrying the same operation may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::TransientNetwork(_) | Self::ChannelDrop(_) | Self::ChannelDegraded { .. }
        )
    }

    /// Check if this should be shown to the user as a notice
    ///
    /// Local guards and anomalies are logged only.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Self::TransientNetwork(_) | Self::ChannelDegraded { .. }
        )
    }
}

/// Result type for sync operations
pub type SyncResult<T> = Result<T, SyncError>;
