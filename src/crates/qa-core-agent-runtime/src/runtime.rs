//! `Runtime`: owns agent instances, their subscriptions, and their lifecycle.

use dashmap::DashMap;
use futures::FutureExt;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use qa_core_bus::MessageBus;
use qa_core_utils::{AgentType, CoreError, TypedMessage};

use crate::agent_trait::Agent;

/// Coarse health classification surfaced by [`Runtime::health`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
    Warning,
    Unhealthy,
    Unknown,
}

/// Atomic/locked counters backing one agent's health snapshot. Cheap to
/// clone (it's an `Arc`) so the factory and external health endpoints can
/// hold a reference independent of the registry entry's lifetime.
#[derive(Default)]
pub struct AgentHealth {
    success_count: AtomicU64,
    error_count: AtomicU64,
    last_request: Mutex<Option<chrono::DateTime<chrono::Utc>>>,
}

impl AgentHealth {
    pub fn record_success(&self) {
        self.success_count.fetch_add(1, Ordering::Relaxed);
        *self.last_request.lock() = Some(chrono::Utc::now());
    }

    pub fn record_error(&self) {
        self.error_count.fetch_add(1, Ordering::Relaxed);
        *self.last_request.lock() = Some(chrono::Utc::now());
    }

    pub fn snapshot(&self) -> AgentHealthSnapshot {
        let success = self.success_count.load(Ordering::Relaxed);
        let errors = self.error_count.load(Ordering::Relaxed);
        let total = success + errors;
        let success_rate = if total == 0 { 1.0 } else { success as f64 / total as f64 };
        let status = match (total, success_rate) {
            (0, _) => HealthStatus::Unknown,
            (_, rate) if rate >= 0.95 => HealthStatus::Healthy,
            (_, rate) if rate >= 0.5 => HealthStatus::Warning,
            _ => HealthStatus::Unhealthy,
        };
        AgentHealthSnapshot {
            status,
            last_request: *self.last_request.lock(),
            success_rate,
            error_count: errors,
        }
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct AgentHealthSnapshot {
    pub status: HealthStatus,
    pub last_request: Option<chrono::DateTime<chrono::Utc>>,
    pub success_rate: f64,
    pub error_count: u64,
}

struct RegisteredAgent {
    agent: Arc<dyn Agent>,
    rx: Mutex<Option<mpsc::Receiver<TypedMessage>>>,
    health: Arc<AgentHealth>,
    dispatch: Mutex<Option<JoinHandle<()>>>,
}

/// Drives every registered agent's handler task. `register` subscribes the
/// agent to the bus immediately so no message published before `start()` is
/// missed; `start()` spawns the per-agent dispatch loops and must be called
/// exactly once.
pub struct Runtime {
    bus: Arc<MessageBus>,
    agents: DashMap<AgentType, RegisteredAgent>,
    started: AtomicBool,
}

impl Runtime {
    pub fn new(bus: Arc<MessageBus>) -> Self {
        Self {
            bus,
            agents: DashMap::new(),
            started: AtomicBool::new(false),
        }
    }

    /// Attach `agent` to its canonical topic. Idempotent (P2): re-registering
    /// an already-registered agent type returns the existing health handle
    /// without a second `bus.subscribe` call.
    pub fn register(&self, agent: Arc<dyn Agent>) -> Arc<AgentHealth> {
        let agent_type = agent.agent_type();
        if let Some(existing) = self.agents.get(&agent_type) {
            return existing.health.clone();
        }

        let topic = agent_type.canonical_topic();
        let rx = self.bus.subscribe(topic, agent_type);
        let health = Arc::new(AgentHealth::default());
        self.agents.insert(
            agent_type,
            RegisteredAgent {
                agent,
                rx: Mutex::new(rx),
                health: health.clone(),
                dispatch: Mutex::new(None),
            },
        );
        health
    }

    /// Begin dispatching. Calling this more than once is a configuration
    /// error — the runtime's dispatch loops are spawned exactly once.
    pub async fn start(&self) -> Result<(), CoreError> {
        if self.started.swap(true, Ordering::AcqRel) {
            return Err(CoreError::configuration("Runtime::start called more than once"));
        }

        for entry in self.agents.iter() {
            let agent_type = *entry.key();
            let Some(rx) = entry.value().rx.lock().take() else {
                tracing::warn!(%agent_type, "no receiver to dispatch on, skipping");
                continue;
            };
            let agent = entry.value().agent.clone();
            let health = entry.value().health.clone();
            agent.on_start().await;
            let handle = tokio::spawn(dispatch_loop(agent, rx, health));
            *entry.value().dispatch.lock() = Some(handle);
        }
        Ok(())
    }

    /// Graceful shutdown: unsubscribes every agent (no new publishes reach
    /// them), lets in-flight handlers finish within `timeout`, then aborts
    /// and runs every agent's cleanup hook regardless of outcome.
    pub async fn stop(&self, timeout: Duration) {
        for entry in self.agents.iter() {
            self.bus.unsubscribe(entry.key().canonical_topic(), *entry.key());
        }

        for entry in self.agents.iter() {
            let handle = entry.value().dispatch.lock().take();
            if let Some(handle) = handle {
                if tokio::time::timeout(timeout, handle).await.is_err() {
                    tracing::warn!(agent_type = %entry.key(), "agent did not stop within timeout, aborting");
                }
            }
            if let Err(e) = std::panic::AssertUnwindSafe(entry.value().agent.on_stop())
                .catch_unwind()
                .await
            {
                tracing::warn!(agent_type = %entry.key(), ?e, "agent cleanup hook panicked");
            }
        }
    }

    /// Explicit admin restart: re-subscribes and respawns the dispatch loop
    /// for `agent_type` using the already-registered agent instance.
    pub async fn restart(&self, agent_type: AgentType) -> Result<(), CoreError> {
        let Some(entry) = self.agents.get(&agent_type) else {
            return Err(CoreError::configuration(format!(
                "cannot restart unregistered agent type {agent_type}"
            )));
        };
        if let Some(old) = entry.dispatch.lock().take() {
            old.abort();
        }
        self.bus.unsubscribe(agent_type.canonical_topic(), agent_type);
        let rx = self
            .bus
            .subscribe(agent_type.canonical_topic(), agent_type)
            .ok_or_else(|| CoreError::fatal("restart: bus still reports a live subscription"))?;
        let agent = entry.agent.clone();
        let health = entry.health.clone();
        agent.on_start().await;
        let handle = tokio::spawn(dispatch_loop(agent, rx, health));
        *entry.dispatch.lock() = Some(handle);
        Ok(())
    }

    pub fn health(&self) -> std::collections::HashMap<AgentType, AgentHealthSnapshot> {
        self.agents
            .iter()
            .map(|entry| (*entry.key(), entry.value().health.snapshot()))
            .collect()
    }
}

async fn dispatch_loop(
    agent: Arc<dyn Agent>,
    mut rx: mpsc::Receiver<TypedMessage>,
    health: Arc<AgentHealth>,
) {
    while let Some(msg) = rx.recv().await {
        let ctx = msg.ctx().clone();
        match agent.handle(msg).await {
            Ok(()) => health.record_success(),
            Err(err) => {
                tracing::error!(
                    session_id = %ctx.session_id,
                    sender = %ctx.sender,
                    error = %err,
                    "agent handler failed"
                );
                health.record_error();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qa_core_utils::{MessageContext, ParseInput, TopicType};
    use std::sync::atomic::AtomicUsize;

    struct CountingAgent {
        agent_type: AgentType,
        handled: Arc<AtomicUsize>,
        fail_next: Arc<AtomicBool>,
    }

    #[async_trait::async_trait]
    impl Agent for CountingAgent {
        fn agent_type(&self) -> AgentType {
            self.agent_type
        }

        async fn handle(&self, _msg: TypedMessage) -> crate::agent_trait::AgentResult {
            self.handled.fetch_add(1, Ordering::SeqCst);
            if self.fail_next.swap(false, Ordering::SeqCst) {
                return Err(CoreError::transient("forced failure"));
            }
            Ok(())
        }
    }

    fn sample_message() -> TypedMessage {
        TypedMessage::ParseInput {
            ctx: MessageContext::new("test"),
            payload: ParseInput {
                content: b"{}".to_vec(),
                format_hint: "auto".to_string(),
            },
        }
    }

    #[tokio::test]
    async fn test_register_is_idempotent() {
        let bus = Arc::new(MessageBus::new());
        let runtime = Runtime::new(bus.clone());
        let agent = Arc::new(CountingAgent {
            agent_type: AgentType::DocParser,
            handled: Arc::new(AtomicUsize::new(0)),
            fail_next: Arc::new(AtomicBool::new(false)),
        });
        let h1 = runtime.register(agent.clone());
        let h2 = runtime.register(agent);
        assert!(Arc::ptr_eq(&h1, &h2));
        assert_eq!(bus.subscriber_count(TopicType::ParseRequest), 1);
    }

    #[tokio::test]
    async fn test_dispatch_processes_messages_and_tracks_health() {
        let bus = Arc::new(MessageBus::new());
        let runtime = Runtime::new(bus.clone());
        let handled = Arc::new(AtomicUsize::new(0));
        let fail_next = Arc::new(AtomicBool::new(true));
        let agent = Arc::new(CountingAgent {
            agent_type: AgentType::DocParser,
            handled: handled.clone(),
            fail_next,
        });
        runtime.register(agent);
        runtime.start().await.unwrap();

        bus.publish(TopicType::ParseRequest, sample_message()).await.unwrap();
        bus.publish(TopicType::ParseRequest, sample_message()).await.unwrap();

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(handled.load(Ordering::SeqCst), 2);

        let health = runtime.health();
        let snapshot = health.get(&AgentType::DocParser).unwrap();
        assert_eq!(snapshot.error_count, 1);
    }

    #[tokio::test]
    async fn test_double_start_errors() {
        let bus = Arc::new(MessageBus::new());
        let runtime = Runtime::new(bus);
        runtime.start().await.unwrap();
        assert!(runtime.start().await.is_err());
    }
}
