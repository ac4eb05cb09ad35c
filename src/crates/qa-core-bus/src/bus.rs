//! `MessageBus`: typed pub/sub with at-most-once delivery per subscriber.
//!
//! Grounded on the teacher's `dashmap` dependency (`orchestrator/Cargo.toml`)
//! and its `BroadcastState` pattern (`api/ws/handler.rs`): a per-topic
//! registry of subscribers, each fed by its own channel rather than a single
//! broadcast channel, so that one slow subscriber cannot starve another and
//! per-(publisher, subscriber) ordering (spec.md §8 I3) falls out of each
//! `mpsc` channel's own FIFO guarantee.

use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

use qa_core_utils::{AgentType, TopicType, TypedMessage};

use crate::error::BusError;

struct Subscriber {
    agent_type: AgentType,
    tx: mpsc::Sender<TypedMessage>,
}

/// The default bounded mailbox capacity (spec.md §5 backpressure: publishers
/// block on a full channel rather than dropping messages).
pub const DEFAULT_MAILBOX_CAPACITY: usize = 256;

pub struct MessageBus {
    subscribers: DashMap<TopicType, Vec<Subscriber>>,
    shutting_down: AtomicBool,
    mailbox_capacity: usize,
}

impl MessageBus {
    pub fn new() -> Self {
        Self::with_mailbox_capacity(DEFAULT_MAILBOX_CAPACITY)
    }

    pub fn with_mailbox_capacity(mailbox_capacity: usize) -> Self {
        Self {
            subscribers: DashMap::new(),
            shutting_down: AtomicBool::new(false),
            mailbox_capacity,
        }
    }

    /// Attach `agent_type` to `topic`. Idempotent: if `agent_type` is already
    /// subscribed to `topic`, this is a no-op and returns `None` — the caller
    /// (the agent runtime) is expected to already hold the original receiver.
    pub fn subscribe(&self, topic: TopicType, agent_type: AgentType) -> Option<mpsc::Receiver<TypedMessage>> {
        let mut entry = self.subscribers.entry(topic).or_default();
        if entry.iter().any(|s| s.agent_type == agent_type) {
            return None;
        }
        let (tx, rx) = mpsc::channel(self.mailbox_capacity);
        entry.push(Subscriber { agent_type, tx });
        Some(rx)
    }

    pub fn unsubscribe(&self, topic: TopicType, agent_type: AgentType) {
        if let Some(mut entry) = self.subscribers.get_mut(&topic) {
            entry.retain(|s| s.agent_type != agent_type);
        }
    }

    /// Deliver `message` to every subscriber of `topic`. An unknown topic
    /// (no subscribers) is silently dropped but logged, not an error.
    pub async fn publish(&self, topic: TopicType, message: TypedMessage) -> Result<(), BusError> {
        if self.shutting_down.load(Ordering::Acquire) {
            return Err(BusError::ShuttingDown);
        }

        let senders: Vec<mpsc::Sender<TypedMessage>> = match self.subscribers.get(&topic) {
            Some(entry) => entry.iter().map(|s| s.tx.clone()).collect(),
            None => {
                tracing::debug!(%topic, "publish to topic with no subscribers");
                return Ok(());
            }
        };

        for tx in senders {
            // A full mailbox blocks the publisher rather than dropping the
            // message, per the designed backpressure path (spec.md §5).
            if tx.send(message.clone()).await.is_err() {
                tracing::warn!(%topic, "subscriber channel closed, message not delivered");
            }
        }
        Ok(())
    }

    /// Stop accepting new publishes; existing subscriber channels are
    /// dropped so in-flight receivers see their stream end.
    pub fn shutdown(&self) {
        self.shutting_down.store(true, Ordering::Release);
        self.subscribers.clear();
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down.load(Ordering::Acquire)
    }

    pub fn subscriber_count(&self, topic: TopicType) -> usize {
        self.subscribers.get(&topic).map(|e| e.len()).unwrap_or(0)
    }
}

impl Default for MessageBus {
    fn default() -> Self {
        Self::new()
    }
}

/// A shared handle to the bus, cloned into every agent and the factory.
pub type SharedBus = Arc<MessageBus>;
