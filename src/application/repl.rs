#[cfg(test)]
#[path = "repl_test.rs"]
mod tests;

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use tokio::io::AsyncBufReadExt;
use tokio::io::BufReader;
use tokio::sync::mpsc;
use yansi::Paint;

use super::cli::help_text;
use crate::configuration::Config;
use crate::domain::models::Author;
use crate::domain::models::Event;
use crate::domain::models::Message;
use crate::domain::models::SharedReplier;
use crate::domain::models::SlashCommand;
use crate::domain::services::replies::KeywordReplier;
use crate::domain::services::ChatController;
use crate::domain::services::ChatOptions;
use crate::domain::services::ConversationStore;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Line {
    Message(Author, String),
    Notice(String),
    Error(String),
    Plain(String),
}

impl Line {
    fn paint(&self) -> String {
        match self {
            Line::Message(Author::User, text) => return Paint::cyan(text).bold().to_string(),
            Line::Message(Author::Assistant, text) => return Paint::green(text).to_string(),
            Line::Notice(text) => return Paint::new(text).dimmed().to_string(),
            Line::Error(text) => return Paint::yellow(text).to_string(),
            Line::Plain(text) => return text.to_string(),
        }
    }
}

/// Terminal line for a message. Tabs are expanded for display only.
pub fn render_message(message: &Message, options: &ChatOptions) -> Line {
    return Line::Message(
        message.author(),
        message
            .as_transcript_entry(options.label(message.author()))
            .replace('\t', "  "),
    );
}

/// Projects store data onto terminal lines. Only tracks how many messages of
/// each conversation were already printed, never reads its own output back.
pub struct Repl {
    controller: ChatController,
    rendered: HashMap<String, usize>,
}

impl Repl {
    pub fn new(controller: ChatController) -> Repl {
        return Repl {
            controller,
            rendered: HashMap::new(),
        };
    }

    fn header(&mut self) -> Vec<Line> {
        let Some(conversation) = self.controller.current() else {
            return vec![];
        };

        let line = Line::Notice(format!(
            "── {} (ID: {}) ──",
            conversation.title, conversation.id
        ));
        let id = conversation.id.to_string();
        self.rendered.remove(&id);

        return vec![line];
    }

    /// New lines for conversation `id` since it was last rendered. Nothing
    /// is shown for conversations that aren't current.
    pub fn sync(&mut self, id: &str) -> Vec<Line> {
        let Some(conversation) = self.controller.current() else {
            return vec![];
        };
        if conversation.id != id {
            return vec![];
        }

        let messages = conversation.messages();
        let mut shown = self.rendered.get(id).copied().unwrap_or(0);
        if messages.len() < shown {
            shown = 0;
        }

        let options = self.controller.options();
        let lines = messages[shown..]
            .iter()
            .map(|message| return render_message(message, options))
            .collect::<Vec<Line>>();

        self.rendered.insert(id.to_string(), messages.len());

        return lines;
    }

    pub fn handle_event(&mut self, event: Event) -> Vec<Line> {
        match event {
            Event::ReplyReady(response) => {
                self.controller.handle_reply(response);
                return vec![];
            }
            Event::StateChanged(id) => {
                return self.sync(&id);
            }
        }
    }

    pub fn start_chat(&mut self) -> Vec<Line> {
        self.controller.on_new_chat(None);
        return self.header();
    }

    fn thinking(&self) -> Line {
        return Line::Notice(format!(
            "{}正在思考...",
            self.controller.options().assistant_label
        ));
    }

    fn history(&self) -> Vec<Line> {
        let store = self.controller.store();
        let current_id = store.current_id();
        let is_waiting = self.controller.is_waiting();
        let mut lines = vec![Line::Plain(format!("{} conversations", store.count()))];

        lines.extend(store.list().iter().map(|conversation| {
            let marker = if Some(conversation.id.as_str()) == current_id {
                "*"
            } else {
                " "
            };
            let waiting = if marker == "*" && is_waiting {
                " (waiting)"
            } else {
                ""
            };
            return Line::Plain(format!(
                "{marker} (ID: {}) {}{waiting}",
                conversation.id,
                conversation.summary()
            ));
        }));

        return lines;
    }

    /// Handles one line of input. Returns whether the REPL should quit,
    /// alongside the lines to print.
    pub fn handle_input(&mut self, input: &str) -> (bool, Vec<Line>) {
        if input.trim().is_empty() {
            return (false, vec![]);
        }

        let Some(command) = SlashCommand::parse(input) else {
            return match self.controller.on_user_send(input) {
                Ok(()) => (false, vec![self.thinking()]),
                Err(err) => (false, vec![Line::Error(err.to_string())]),
            };
        };

        if command.is_quit() {
            return (true, vec![]);
        }

        if command.is_help() {
            return (false, vec![Line::Plain(help_text())]);
        }

        if command.is_list_chats() {
            return (false, self.history());
        }

        if command.is_new_chat() {
            let title = command.rest();
            let title = if title.is_empty() {
                None
            } else {
                Some(title.as_str())
            };
            self.controller.on_new_chat(title);
            return (false, self.header());
        }

        if command.is_switch_chat() {
            let Some(id) = command.args.first() else {
                return (
                    false,
                    vec![Line::Error(
                        "You must specify a conversation ID with `/switch` or `/s`. Run `/list` to see them."
                            .to_string(),
                    )],
                );
            };

            return match self.controller.on_switch_chat(id) {
                Ok(()) => (false, self.header()),
                Err(err) => (false, vec![Line::Error(err.to_string())]),
            };
        }

        if command.is_clear_chat() {
            return match self.controller.on_clear_chat() {
                Ok(()) => (false, vec![Line::Notice("对话已清除".to_string())]),
                Err(err) => (false, vec![Line::Error(err.to_string())]),
            };
        }

        if command.is_regenerate() {
            return match self.controller.on_regenerate_last() {
                Ok(true) => (false, vec![self.thinking()]),
                Ok(false) => (
                    false,
                    vec![Line::Error("There is no message to reply to yet.".to_string())],
                ),
                Err(err) => (false, vec![Line::Error(err.to_string())]),
            };
        }

        if command.is_copy_chat() {
            return match self.controller.on_copy_all() {
                Ok(text) => (false, vec![Line::Plain(text)]),
                Err(err) => (false, vec![Line::Error(err.to_string())]),
            };
        }

        if command.is_rename_chat() {
            return match self.controller.on_rename_chat(&command.rest()) {
                Ok(()) => (false, self.header()),
                Err(err) => (false, vec![Line::Error(err.to_string())]),
            };
        }

        return (false, vec![]);
    }
}

fn print_lines(lines: Vec<Line>) {
    for line in lines {
        println!("{}", line.paint());
    }
}

fn build_controller(event_tx: mpsc::UnboundedSender<Event>) -> Result<ChatController> {
    let options = Config::chat_options()?;
    let replier: SharedReplier = match Config::reply_seed()? {
        Some(seed) => Arc::new(KeywordReplier::with_seed(seed)),
        None => Arc::new(KeywordReplier::default()),
    };

    let mut store = ConversationStore::with_conversations(vec![], None)?;
    store.subscribe(event_tx.clone());

    tracing::debug!(
        replier = replier.name(),
        delay_ms = options.reply_delay.as_millis() as u64,
        "Starting chat"
    );

    return Ok(ChatController::new(store, replier, options, event_tx));
}

pub async fn start(
    event_tx: mpsc::UnboundedSender<Event>,
    mut event_rx: mpsc::UnboundedReceiver<Event>,
) -> Result<()> {
    let mut repl = Repl::new(build_controller(event_tx)?);
    let mut input = BufReader::new(tokio::io::stdin()).lines();

    print_lines(vec![Line::Notice(format!(
        "Parley {}. Type /help for commands.",
        env!("CARGO_PKG_VERSION")
    ))]);
    print_lines(repl.start_chat());

    loop {
        tokio::select! {
            line = input.next_line() => {
                let Some(line) = line? else {
                    break;
                };

                let (should_quit, lines) = repl.handle_input(&line);
                print_lines(lines);
                if should_quit {
                    break;
                }
            }
            event = event_rx.recv() => {
                let Some(event) = event else {
                    break;
                };
                print_lines(repl.handle_event(event));
            }
        }
    }

    return Ok(());
}
