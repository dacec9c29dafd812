#[cfg(test)]
#[path = "reply_test.rs"]
mod tests;

use std::sync::Arc;

/// Lifecycle of a single scheduled reply. `Fired` and `Cancelled` are
/// terminal.
#[derive(Copy, Clone, Debug, PartialEq, Eq, strum::Display, strum::FromRepr)]
#[strum(serialize_all = "lowercase")]
#[repr(u8)]
pub enum ReplyState {
    Idle,
    Pending,
    Fired,
    Cancelled,
}

impl ReplyState {
    pub fn is_terminal(&self) -> bool {
        return matches!(self, ReplyState::Fired | ReplyState::Cancelled);
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReplyResponse {
    pub ticket: u64,
    pub conversation_id: String,
    pub text: String,
}

/// Produces the assistant text for a user prompt.
pub trait Replier: Send + Sync {
    fn name(&self) -> &str;

    fn get_reply(&self, prompt: &str) -> String;
}

pub type SharedReplier = Arc<dyn Replier>;
