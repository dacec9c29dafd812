#[cfg(test)]
#[path = "reply_scheduler_test.rs"]
mod tests;

use std::sync::atomic::AtomicU8;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time;

use crate::domain::models::Event;
use crate::domain::models::ReplyResponse;
use crate::domain::models::ReplyState;
use crate::domain::models::SharedReplier;

pub const DEFAULT_REPLY_DELAY: Duration = Duration::from_millis(1500);

fn transition(state: &AtomicU8, from: ReplyState, to: ReplyState) -> bool {
    return state
        .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
        .is_ok();
}

/// Handle to one scheduled reply. Dropping it does not cancel the reply.
pub struct ReplyHandle {
    ticket: u64,
    conversation_id: String,
    state: Arc<AtomicU8>,
    worker: JoinHandle<()>,
}

impl ReplyHandle {
    pub fn ticket(&self) -> u64 {
        return self.ticket;
    }

    pub fn conversation_id(&self) -> &str {
        return &self.conversation_id;
    }

    pub fn state(&self) -> ReplyState {
        return ReplyState::from_repr(self.state.load(Ordering::Acquire))
            .unwrap_or(ReplyState::Cancelled);
    }

    /// Suppresses the reply if it has not fired yet. Returns whether the
    /// cancel took effect.
    pub fn cancel(&self) -> bool {
        if self.state().is_terminal() {
            return false;
        }
        if !transition(&self.state, ReplyState::Pending, ReplyState::Cancelled) {
            return false;
        }

        self.worker.abort();
        tracing::debug!(
            ticket = self.ticket,
            conversation_id = self.conversation_id.as_str(),
            "Cancelled reply"
        );

        return true;
    }
}

/// Simulates assistant latency: each scheduled prompt is answered once,
/// after a fixed delay, by sending `Event::ReplyReady`.
pub struct ReplyScheduler {
    delay: Duration,
    replier: SharedReplier,
    tx: mpsc::UnboundedSender<Event>,
    next_ticket: u64,
}

impl ReplyScheduler {
    pub fn new(
        replier: SharedReplier,
        delay: Duration,
        tx: mpsc::UnboundedSender<Event>,
    ) -> ReplyScheduler {
        return ReplyScheduler {
            delay,
            replier,
            tx,
            next_ticket: 0,
        };
    }

    pub fn delay(&self) -> Duration {
        return self.delay;
    }

    pub fn replier_name(&self) -> &str {
        return self.replier.name();
    }

    pub fn schedule(&mut self, conversation_id: &str, prompt: &str) -> ReplyHandle {
        self.next_ticket += 1;
        let ticket = self.next_ticket;
        let state = Arc::new(AtomicU8::new(ReplyState::Idle as u8));

        let worker_state = state.clone();
        let worker_tx = self.tx.clone();
        let replier = self.replier.clone();
        let delay = self.delay;
        let worker_conversation_id = conversation_id.to_string();
        let prompt = prompt.to_string();

        transition(&state, ReplyState::Idle, ReplyState::Pending);
        let worker = tokio::spawn(async move {
            time::sleep(delay).await;
            if !transition(&worker_state, ReplyState::Pending, ReplyState::Fired) {
                return;
            }

            let text = replier.get_reply(&prompt);
            let res = worker_tx.send(Event::ReplyReady(ReplyResponse {
                ticket,
                conversation_id: worker_conversation_id,
                text,
            }));

            if res.is_err() {
                tracing::warn!(ticket, "Reply fired after the receiver closed");
            }
        });

        tracing::debug!(
            ticket,
            conversation_id,
            delay_ms = delay.as_millis() as u64,
            "Scheduled reply"
        );

        return ReplyHandle {
            ticket,
            conversation_id: conversation_id.to_string(),
            state,
            worker,
        };
    }
}
