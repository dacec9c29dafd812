mod author;
mod conversation;
mod error;
mod event;
mod message;
mod reply;
mod slash_commands;

pub use author::*;
pub use conversation::*;
pub use error::*;
pub use event::*;
pub use message::*;
pub use reply::*;
pub use slash_commands::*;
