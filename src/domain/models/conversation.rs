#[cfg(test)]
#[path = "conversation_test.rs"]
mod tests;

use chrono::Local;
use chrono::SecondsFormat;

use super::Author;
use super::Message;

pub const DEFAULT_TITLE: &str = "新对话";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Conversation {
    pub id: String,
    pub title: String,
    pub created_at: String,
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new(id: &str, title: &str) -> Conversation {
        return Conversation {
            id: id.to_string(),
            title: title.to_string(),
            created_at: Local::now().to_rfc3339_opts(SecondsFormat::Secs, false),
            messages: vec![],
        };
    }

    pub fn messages(&self) -> &[Message] {
        return &self.messages;
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn last_from(&self, author: Author) -> Option<&Message> {
        return self
            .messages
            .iter()
            .rev()
            .find(|message| return message.is_from(author));
    }

    /// One line summary used by history listings,
    /// `title (n messages, created_at)`.
    pub fn summary(&self) -> String {
        return format!(
            "{} ({} messages, {})",
            self.title,
            self.messages.len(),
            self.created_at
        );
    }
}
