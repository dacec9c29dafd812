mod chat_controller;
mod conversation_store;
pub mod replies;
mod reply_scheduler;

pub use chat_controller::*;
pub use conversation_store::*;
pub use reply_scheduler::*;
