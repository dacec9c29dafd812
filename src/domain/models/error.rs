use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChatError {
    #[error("No conversation found for id {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Still waiting on a reply for conversation {0}")]
    ReplyPending(String),

    #[error("There is no active conversation. Start one with /new")]
    NoActiveConversation,
}
