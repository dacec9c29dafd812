#[cfg(test)]
#[path = "chat_controller_test.rs"]
mod tests;

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::mpsc;

use super::ConversationStore;
use super::ReplyHandle;
use super::ReplyScheduler;
use super::DEFAULT_REPLY_DELAY;
use crate::domain::models::Author;
use crate::domain::models::ChatError;
use crate::domain::models::Conversation;
use crate::domain::models::Event;
use crate::domain::models::Message;
use crate::domain::models::ReplyResponse;
use crate::domain::models::SharedReplier;
use crate::domain::models::DEFAULT_TITLE;

pub const NEW_CHAT_GREETING: &str = "你好！我是DeepSeek AI助手，很高兴为你服务。我可以帮你解答问题、提供信息、协助编程、分析文档等等。请告诉我你需要什么帮助？";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChatOptions {
    pub reply_delay: Duration,
    pub user_label: String,
    pub assistant_label: String,
    pub new_chat_title: String,
    pub greeting: String,
}

impl Default for ChatOptions {
    fn default() -> ChatOptions {
        return ChatOptions {
            reply_delay: DEFAULT_REPLY_DELAY,
            user_label: "你".to_string(),
            assistant_label: "AI".to_string(),
            new_chat_title: DEFAULT_TITLE.to_string(),
            greeting: NEW_CHAT_GREETING.to_string(),
        };
    }
}

impl ChatOptions {
    pub fn label(&self, author: Author) -> &str {
        match author {
            Author::User => return &self.user_label,
            Author::Assistant => return &self.assistant_label,
        }
    }
}

/// Entry points for the presentation layer. Owns the store and every
/// outstanding reply, keyed by the conversation it targets.
pub struct ChatController {
    store: ConversationStore,
    scheduler: ReplyScheduler,
    pending: HashMap<String, ReplyHandle>,
    options: ChatOptions,
}

impl ChatController {
    pub fn new(
        store: ConversationStore,
        replier: SharedReplier,
        options: ChatOptions,
        tx: mpsc::UnboundedSender<Event>,
    ) -> ChatController {
        return ChatController {
            store,
            scheduler: ReplyScheduler::new(replier, options.reply_delay, tx),
            pending: HashMap::new(),
            options,
        };
    }

    pub fn store(&self) -> &ConversationStore {
        return &self.store;
    }

    pub fn options(&self) -> &ChatOptions {
        return &self.options;
    }

    pub fn current(&self) -> Option<&Conversation> {
        return self.store.current();
    }

    fn current_id(&self) -> Result<String, ChatError> {
        return self
            .store
            .current_id()
            .map(|e| return e.to_string())
            .ok_or(ChatError::NoActiveConversation);
    }

    /// Whether the current conversation is waiting on a reply. Sending is
    /// disabled until the reply is applied or cancelled.
    pub fn is_waiting(&self) -> bool {
        return self
            .store
            .current_id()
            .is_some_and(|id| return self.pending.contains_key(id));
    }

    fn cancel_pending(&mut self, id: &str) {
        if let Some(handle) = self.pending.remove(id) {
            if !handle.cancel() {
                tracing::debug!(
                    ticket = handle.ticket(),
                    state = %handle.state(),
                    "Reply was already settled"
                );
            }
        }
    }

    fn cancel_current(&mut self) {
        if let Some(id) = self.store.current_id().map(|e| return e.to_string()) {
            self.cancel_pending(&id);
        }
    }

    fn schedule(&mut self, id: &str, prompt: &str) {
        let handle = self.scheduler.schedule(id, prompt);
        tracing::debug!(
            ticket = handle.ticket(),
            conversation_id = handle.conversation_id(),
            replier = self.scheduler.replier_name(),
            delay_ms = self.scheduler.delay().as_millis() as u64,
            "Waiting on reply"
        );
        self.pending.insert(handle.conversation_id().to_string(), handle);
    }

    fn ensure_idle(&self, id: &str) -> Result<(), ChatError> {
        if self.pending.contains_key(id) {
            return Err(ChatError::ReplyPending(id.to_string()));
        }

        return Ok(());
    }

    pub fn on_user_send(&mut self, text: &str) -> Result<(), ChatError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ChatError::InvalidInput(
                "Message can't be empty.".to_string(),
            ));
        }

        let id = match self.store.current_id() {
            Some(id) => id.to_string(),
            None => self.on_new_chat(None),
        };
        self.ensure_idle(&id)?;

        self.store.append_message(&id, Author::User, text)?;
        self.schedule(&id, text);

        return Ok(());
    }

    pub fn on_new_chat(&mut self, title: Option<&str>) -> String {
        self.cancel_current();

        let title = title
            .map(|e| return e.trim())
            .filter(|e| return !e.is_empty())
            .unwrap_or(&self.options.new_chat_title)
            .to_string();
        let id = self.store.create_conversation(Some(&title));

        if !self.options.greeting.is_empty() {
            let greeting = self.options.greeting.to_string();
            if let Err(err) = self.store.append_message(&id, Author::Assistant, &greeting) {
                tracing::error!(error = ?err, "Failed to greet new conversation");
            }
        }

        return id;
    }

    pub fn on_switch_chat(&mut self, id: &str) -> Result<(), ChatError> {
        let previous = self.store.current_id().map(|e| return e.to_string());
        self.store.switch_to(id)?;

        if let Some(previous) = previous {
            if previous != id {
                self.cancel_pending(&previous);
            }
        }

        return Ok(());
    }

    pub fn on_clear_chat(&mut self) -> Result<(), ChatError> {
        let id = self.current_id()?;
        self.cancel_pending(&id);
        self.store.clear(&id)?;

        return Ok(());
    }

    pub fn on_rename_chat(&mut self, title: &str) -> Result<(), ChatError> {
        let id = self.current_id()?;
        self.store.rename(&id, title)?;

        return Ok(());
    }

    /// Asks for a fresh reply to the last user message of the current
    /// conversation. The new reply is appended, earlier ones are kept.
    /// Returns false when there is nothing to regenerate.
    pub fn on_regenerate_last(&mut self) -> Result<bool, ChatError> {
        let id = self.current_id()?;
        self.ensure_idle(&id)?;

        let prompt = match self
            .store
            .get(&id)
            .and_then(|conversation| return conversation.last_from(Author::User))
        {
            Some(message) => message.text().to_string(),
            None => return Ok(false),
        };

        self.schedule(&id, &prompt);

        return Ok(true);
    }

    /// The current conversation as plain text, built from message data.
    pub fn on_copy_all(&self) -> Result<String, ChatError> {
        let id = self.current_id()?;
        let messages = self.store.get_messages(&id)?;

        return Ok(format_transcript(messages, &self.options));
    }

    /// Applies a fired reply. Replies whose conversation is no longer
    /// current, or whose handle was cancelled or replaced, are dropped.
    pub fn handle_reply(&mut self, response: ReplyResponse) -> bool {
        let is_expected = self
            .pending
            .get(&response.conversation_id)
            .is_some_and(|handle| return handle.ticket() == response.ticket);
        if !is_expected {
            tracing::debug!(
                ticket = response.ticket,
                conversation_id = response.conversation_id.as_str(),
                "Dropping stale reply"
            );
            return false;
        }

        self.pending.remove(&response.conversation_id);
        if self.store.current_id() != Some(response.conversation_id.as_str()) {
            tracing::debug!(
                ticket = response.ticket,
                conversation_id = response.conversation_id.as_str(),
                "Dropping reply for a conversation that is no longer current"
            );
            return false;
        }

        let res = self.store.append_message(
            &response.conversation_id,
            Author::Assistant,
            &response.text,
        );
        if let Err(err) = res {
            tracing::error!(error = ?err, "Failed to apply reply");
            return false;
        }

        return true;
    }
}

pub fn format_transcript(messages: &[Message], options: &ChatOptions) -> String {
    return messages
        .iter()
        .map(|message| return message.as_transcript_entry(options.label(message.author())))
        .collect::<Vec<String>>()
        .join("\n\n");
}
