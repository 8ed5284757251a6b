//! Message entity - a question posted in a room

use crate::value_objects::MessageId;

/// Message entity
///
/// `text` never changes after creation. `answered` and `reaction_count` are owned by
/// the server; the client only ever adopts values it was told about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: MessageId,
    pub text: String,
    pub answered: bool,
    pub reaction_count: u64,
}

impl Message {
    /// Create a new, unanswered message without reactions
    pub fn new(id: impl Into<MessageId>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            answered: false,
            reaction_count: 0,
        }
    }

    /// Set the reaction count
    #[must_use]
    pub fn with_reactions(mut self, count: u64) -> Self {
        self.reaction_count = count;
        self
    }

    /// Mark as answered
    #[must_use]
    pub fn answered(mut self) -> Self {
        self.answered = true;
        self
    }

    /// Get a truncated preview of the text (for logs and notices)
    pub fn preview(&self, max_len: usize) -> &str {
        if self.text.len() <= max_len {
            &self.text
        } else {
            let mut end = max_len;
            while !self.text.is_char_boundary(end) && end > 0 {
                end -= 1;
            }
            &self.text[..end]
        }
    }
}
