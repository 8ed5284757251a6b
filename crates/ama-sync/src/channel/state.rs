//! Live channel connection state

use serde::Serialize;
use std::fmt;

/// Connection state of the live event channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelState {
    /// Created, not yet started
    #[default]
    Idle,
    /// Opening the socket (first connect or reconnect)
    Connecting,
    /// Receiving events
    Open,
    /// Torn down; terminal
    Closed,
}

impl ChannelState {
    /// Check whether moving to `next` is a legal transition
    ///
    /// `Connecting -> Connecting` covers a failed attempt followed by another.
    #[must_use]
    pub const fn can_transition(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Connecting | Self::Closed)
                | (
                    Self::Connecting,
                    Self::Connecting | Self::Open | Self::Closed
                )
                | (Self::Open, Self::Connecting | Self::Closed)
        )
    }

    #[must_use]
    pub const fn is_open(self) -> bool {
        matches!(self, Self::Open)
    }

    #[must_use]
    pub const fn is_closed(self) -> bool {
        matches!(self, Self::Closed)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for ChannelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
