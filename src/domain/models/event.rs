use super::ReplyResponse;

#[derive(Debug, PartialEq, Eq)]
pub enum Event {
    /// A scheduled reply fired and is ready to be applied.
    ReplyReady(ReplyResponse),
    /// The conversation with the given id changed and should be re-rendered.
    StateChanged(String),
}
