//! Session-scoped model history shared by all agents.
//!
//! Every agent in a session reads and extends the same history, so the
//! specialist sees what the coordinator discussed and the scribe sees both.
//! Only user inputs and final assistant texts are kept; tool traffic stays
//! inside the turn that produced it.

use mediscreen_core::message::Message;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Clone, Default)]
pub struct SharedHistory {
    messages: Arc<RwLock<Vec<Message>>>,
}

impl SharedHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the history in conversation order.
    pub async fn snapshot(&self) -> Vec<Message> {
        self.messages.read().await.clone()
    }

    /// Record one completed exchange. Blank replies are not kept.
    pub async fn record_exchange(&self, input: &str, reply: &str) {
        let mut messages = self.messages.write().await;
        messages.push(Message::user(input));
        if !reply.trim().is_empty() {
            messages.push(Message::assistant(reply));
        }
    }

    pub async fn len(&self) -> usize {
        self.messages.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.messages.read().await.is_empty()
    }
}
