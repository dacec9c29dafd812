#[cfg(test)]
#[path = "conversation_store_test.rs"]
mod tests;

use std::collections::HashMap;

use chrono::Local;
use tokio::sync::mpsc;

use crate::domain::models::Author;
use crate::domain::models::ChatError;
use crate::domain::models::Conversation;
use crate::domain::models::Event;
use crate::domain::models::Message;
use crate::domain::models::DEFAULT_TITLE;

/// Owns every conversation and tracks which one is current. All mutations
/// notify subscribed observers with `Event::StateChanged`.
#[derive(Default)]
pub struct ConversationStore {
    current_id: Option<String>,
    conversations: HashMap<String, Conversation>,
    order: Vec<String>,
    next_seq: u64,
    observers: Vec<mpsc::UnboundedSender<Event>>,
}

impl ConversationStore {
    pub fn new() -> ConversationStore {
        return ConversationStore::default();
    }

    /// Builds a store from existing conversations, in creation order. The
    /// given `current_id` must key one of them.
    pub fn with_conversations(
        conversations: Vec<Conversation>,
        current_id: Option<&str>,
    ) -> Result<ConversationStore, ChatError> {
        let mut store = ConversationStore::new();
        for conversation in conversations {
            if !store.conversations.contains_key(&conversation.id) {
                store.order.push(conversation.id.to_string());
            }
            store
                .conversations
                .insert(conversation.id.to_string(), conversation);
        }

        if let Some(id) = current_id {
            if !store.conversations.contains_key(id) {
                return Err(ChatError::NotFound(id.to_string()));
            }
            store.current_id = Some(id.to_string());
        }

        return Ok(store);
    }

    pub fn subscribe(&mut self, tx: mpsc::UnboundedSender<Event>) {
        self.observers.push(tx);
    }

    fn notify(&mut self, id: &str) {
        let before = self.observers.len();
        self.observers
            .retain(|tx| return tx.send(Event::StateChanged(id.to_string())).is_ok());

        let pruned = before - self.observers.len();
        if pruned > 0 {
            tracing::warn!(pruned, "Dropped closed store observers");
        }
    }

    fn create_id(&mut self) -> String {
        let millis = Local::now().timestamp_millis();
        loop {
            self.next_seq += 1;
            let id = format!("chat_{millis}_{}", self.next_seq);
            if !self.conversations.contains_key(&id) {
                return id;
            }
        }
    }

    pub fn create_conversation(&mut self, title: Option<&str>) -> String {
        let id = self.create_id();
        let title = title
            .map(|e| return e.trim())
            .filter(|e| return !e.is_empty())
            .unwrap_or(DEFAULT_TITLE);

        self.conversations
            .insert(id.to_string(), Conversation::new(&id, title));
        self.order.push(id.to_string());
        self.current_id = Some(id.to_string());

        tracing::debug!(id = %id, title, "Created conversation");
        self.notify(&id);

        return id;
    }

    pub fn switch_to(&mut self, id: &str) -> Result<(), ChatError> {
        if !self.conversations.contains_key(id) {
            return Err(ChatError::NotFound(id.to_string()));
        }

        self.current_id = Some(id.to_string());
        tracing::debug!(id, "Switched conversation");
        self.notify(id);

        return Ok(());
    }

    pub fn append_message(&mut self, id: &str, author: Author, text: &str) -> Result<(), ChatError> {
        let conversation = self
            .conversations
            .get_mut(id)
            .ok_or_else(|| return ChatError::NotFound(id.to_string()))?;

        if author.is_untrusted() && text.trim().is_empty() {
            return Err(ChatError::InvalidInput(
                "Message can't be empty.".to_string(),
            ));
        }

        conversation.push(Message::new(author, text));
        self.notify(id);

        return Ok(());
    }

    pub fn get_messages(&self, id: &str) -> Result<&[Message], ChatError> {
        return self
            .get(id)
            .map(|conversation| return conversation.messages())
            .ok_or_else(|| return ChatError::NotFound(id.to_string()));
    }

    pub fn clear(&mut self, id: &str) -> Result<(), ChatError> {
        let conversation = self
            .conversations
            .get_mut(id)
            .ok_or_else(|| return ChatError::NotFound(id.to_string()))?;

        conversation.clear();
        tracing::debug!(id, "Cleared conversation");
        self.notify(id);

        return Ok(());
    }

    pub fn rename(&mut self, id: &str, title: &str) -> Result<(), ChatError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(ChatError::InvalidInput("Title can't be empty.".to_string()));
        }

        let conversation = self
            .conversations
            .get_mut(id)
            .ok_or_else(|| return ChatError::NotFound(id.to_string()))?;

        conversation.title = title.to_string();
        self.notify(id);

        return Ok(());
    }

    pub fn current_id(&self) -> Option<&str> {
        return self.current_id.as_deref();
    }

    pub fn current(&self) -> Option<&Conversation> {
        return self.current_id.as_deref().and_then(|id| return self.get(id));
    }

    pub fn get(&self, id: &str) -> Option<&Conversation> {
        return self.conversations.get(id);
    }

    /// Conversations ordered newest first, the way the history list shows
    /// them.
    pub fn list(&self) -> Vec<&Conversation> {
        return self
            .order
            .iter()
            .rev()
            .filter_map(|id| return self.conversations.get(id))
            .collect();
    }

    pub fn count(&self) -> usize {
        return self.conversations.len();
    }
}
