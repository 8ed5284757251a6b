//! Reaction types - the client's like/unlike action and its server outcome

use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of a reaction request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactionDirection {
    Add,
    Remove,
}

impl ReactionDirection {
    /// The direction that undoes this one
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Add => Self::Remove,
            Self::Remove => Self::Add,
        }
    }

    /// Whether a confirmed request in this direction leaves the client reacted
    #[inline]
    pub const fn is_add(self) -> bool {
        matches!(self, Self::Add)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Remove => "remove",
        }
    }
}

impl fmt::Display for ReactionDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a reaction request as seen by the overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionOutcome {
    /// Server accepted the request and reported the new absolute count
    Confirmed(u64),
    /// Request failed; no count is known
    Failed,
}

impl ReactionOutcome {
    /// Confirmed count, if any
    pub fn confirmed_count(self) -> Option<u64> {
        match self {
            Self::Confirmed(count) => Some(count),
            Self::Failed => None,
        }
    }
}
