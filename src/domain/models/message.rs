#[cfg(test)]
#[path = "message_test.rs"]
mod tests;

use super::Author;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    author: Author,
    text: String,
}

impl Message {
    pub fn new(author: Author, text: &str) -> Message {
        return Message {
            author,
            text: text.to_string(),
        };
    }

    pub fn author(&self) -> Author {
        return self.author;
    }

    pub fn text(&self) -> &str {
        return &self.text;
    }

    pub fn is_from(&self, author: Author) -> bool {
        return self.author == author;
    }

    /// Formats the message as a single transcript entry, `label: text`.
    pub fn as_transcript_entry(&self, label: &str) -> String {
        return format!("{label}: {}", self.text);
    }
}
