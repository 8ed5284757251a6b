//! Reaction count as it appears on the wire
//!
//! The server is inconsistent: message listings carry a JSON number while the
//! react endpoints return the count as a decimal string. Both decode here.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Absolute, non-negative reaction count
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ReactionCount(u64);

impl ReactionCount {
    #[must_use]
    pub const fn new(count: u64) -> Self {
        Self(count)
    }

    #[inline]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ReactionCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ReactionCount {
    fn from(count: u64) -> Self {
        Self(count)
    }
}

impl From<ReactionCount> for u64 {
    fn from(count: ReactionCount) -> Self {
        count.0
    }
}

impl Serialize for ReactionCount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(self.0)
    }
}

// Deserialize from string or number
impl<'de> Deserialize<'de> for ReactionCount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::{self, Visitor};

        struct CountVisitor;

        impl Visitor<'_> for CountVisitor {
            type Value = ReactionCount;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a non-negative integer or a decimal string")
            }

            fn visit_u64<E>(self, value: u64) -> Result<ReactionCount, E>
            where
                E: de::Error,
            {
                Ok(ReactionCount(value))
            }

            fn visit_i64<E>(self, value: i64) -> Result<ReactionCount, E>
            where
                E: de::Error,
            {
                u64::try_from(value)
                    .map(ReactionCount)
                    .map_err(|_| de::Error::custom("reaction count cannot be negative"))
            }

            fn visit_str<E>(self, value: &str) -> Result<ReactionCount, E>
            where
                E: de::Error,
            {
                value
                    .trim()
                    .parse::<u64>()
                    .map(ReactionCount)
                    .map_err(|_| de::Error::custom("invalid reaction count string"))
            }
        }

        deserializer.deserialize_any(CountVisitor)
    }
}
