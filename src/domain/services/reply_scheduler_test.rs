use std::sync::Arc;
use std::time::Duration;

use anyhow::bail;
use anyhow::Result;
use tokio::sync::mpsc;
use tokio::time;

use super::ReplyScheduler;
use super::DEFAULT_REPLY_DELAY;
use crate::domain::models::Author;
use crate::domain::models::Event;
use crate::domain::models::Replier;
use crate::domain::models::ReplyState;
use crate::domain::services::replies::KeywordReplier;
use crate::domain::services::replies::GREETING_REPLY;
use crate::domain::services::ConversationStore;

struct EchoReplier {}

impl Replier for EchoReplier {
    fn name(&self) -> &str {
        return "echo";
    }

    fn get_reply(&self, prompt: &str) -> String {
        return format!("echo: {prompt}");
    }
}

fn scheduler() -> (ReplyScheduler, mpsc::UnboundedReceiver<Event>) {
    let (tx, rx) = mpsc::unbounded_channel::<Event>();
    let scheduler = ReplyScheduler::new(Arc::new(EchoReplier {}), DEFAULT_REPLY_DELAY, tx);
    return (scheduler, rx);
}

#[tokio::test(start_paused = true)]
async fn it_fires_after_the_delay() -> Result<()> {
    let (mut scheduler, mut rx) = scheduler();
    let handle = scheduler.schedule("chat_1", "hello");

    assert_eq!(handle.state(), ReplyState::Pending);
    assert_eq!(handle.conversation_id(), "chat_1");

    time::sleep(Duration::from_millis(1499)).await;
    assert!(rx.try_recv().is_err());

    match rx.recv().await {
        Some(Event::ReplyReady(response)) => {
            assert_eq!(response.ticket, handle.ticket());
            assert_eq!(response.conversation_id, "chat_1");
            assert_eq!(response.text, "echo: hello");
        }
        _ => bail!("Wrong enum"),
    }
    assert_eq!(handle.state(), ReplyState::Fired);

    return Ok(());
}

#[tokio::test(start_paused = true)]
async fn it_suppresses_cancelled_replies() -> Result<()> {
    let (mut scheduler, mut rx) = scheduler();
    let handle = scheduler.schedule("chat_1", "hello");

    time::sleep(Duration::from_millis(500)).await;
    assert!(handle.cancel());
    assert_eq!(handle.state(), ReplyState::Cancelled);

    time::sleep(DEFAULT_REPLY_DELAY * 2).await;
    assert!(rx.try_recv().is_err());

    return Ok(());
}

#[tokio::test(start_paused = true)]
async fn it_cannot_cancel_after_firing() -> Result<()> {
    let (mut scheduler, mut rx) = scheduler();
    let handle = scheduler.schedule("chat_1", "hello");

    assert!(rx.recv().await.is_some());
    assert!(!handle.cancel());
    assert_eq!(handle.state(), ReplyState::Fired);

    return Ok(());
}

#[tokio::test(start_paused = true)]
async fn it_cancels_only_once() {
    let (mut scheduler, _rx) = scheduler();
    let handle = scheduler.schedule("chat_1", "hello");

    assert!(handle.cancel());
    assert!(!handle.cancel());
    assert_eq!(handle.state(), ReplyState::Cancelled);
}

#[tokio::test(start_paused = true)]
async fn it_issues_increasing_tickets() {
    let (mut scheduler, _rx) = scheduler();
    let first = scheduler.schedule("chat_1", "a");
    let second = scheduler.schedule("chat_2", "b");

    assert!(second.ticket() > first.ticket());
    assert_eq!(scheduler.replier_name(), "echo");
    assert_eq!(scheduler.delay(), DEFAULT_REPLY_DELAY);
}

#[tokio::test(start_paused = true)]
async fn it_delivers_a_greeting_end_to_end() -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel::<Event>();
    let mut scheduler =
        ReplyScheduler::new(Arc::new(KeywordReplier::with_seed(3)), DEFAULT_REPLY_DELAY, tx);
    let mut store = ConversationStore::new();

    let id = store.create_conversation(None);
    store.append_message(&id, Author::User, "你好")?;
    scheduler.schedule(&id, "你好");

    match rx.recv().await {
        Some(Event::ReplyReady(response)) => {
            store.append_message(&response.conversation_id, Author::Assistant, &response.text)?;
        }
        _ => bail!("Wrong enum"),
    }

    let messages = store
        .get_messages(&id)?
        .iter()
        .map(|e| return (e.author(), e.text().to_string()))
        .collect::<Vec<_>>();

    assert_eq!(
        messages,
        vec![
            (Author::User, "你好".to_string()),
            (Author::Assistant, GREETING_REPLY.to_string()),
        ]
    );

    return Ok(());
}
