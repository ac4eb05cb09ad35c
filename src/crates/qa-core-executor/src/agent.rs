//! `ExecutorAgent`/`PlaywrightExecutorAgent`: thin `Agent` wrappers around
//! [`ScriptExecutor`], one per pipeline (API, UI). Both subscribe to their
//! own canonical topic but publish the terminal result to the same
//! `ExecutionOutput`/`LogRecord` topics — the runtime does not constrain how
//! many agents *publish* to a topic, only how many *subscribe* to it.

use std::sync::Arc;

use async_trait::async_trait;

use qa_core_agent_runtime::{Agent, AgentResult};
use qa_core_agents::persistence_store::PersistenceStore;
use qa_core_bus::SharedBus;
use qa_core_utils::{AgentType, LogLevel, LogRecord, StreamResponse, TopicType, TypedMessage};

use crate::executor::ScriptExecutor;

/// Relays `(category, line)` pairs from the executor onto the stream-output
/// topic as non-final `StreamResponse`s, one per line, until the sending
/// side of `rx` is dropped (spec.md §4.7 step 4). Runs concurrently with the
/// execution it's streaming from the caller's perspective, but is awaited
/// to completion before the caller proceeds so every line is published
/// before the terminal response.
async fn relay_lines(
    bus: &SharedBus,
    ctx: &qa_core_utils::MessageContext,
    source: &str,
    mut rx: tokio::sync::mpsc::UnboundedReceiver<(String, String)>,
) {
    while let Some((category, line)) = rx.recv().await {
        let response = StreamResponse {
            source: source.to_string(),
            content: format!("[{category}] {line}"),
            is_final: false,
            result: None,
        };
        let publish = bus
            .publish(
                TopicType::StreamOutput,
                TypedMessage::StreamResponse { ctx: ctx.clone(), payload: response },
            )
            .await;
        if let Err(err) = publish {
            tracing::warn!(%err, "failed to publish execution stream line");
        }
    }
}

async fn run_and_publish(
    executor: &ScriptExecutor,
    bus: &SharedBus,
    store: &dyn PersistenceStore,
    source: &str,
    msg: TypedMessage,
) -> AgentResult {
    let TypedMessage::ExecutionInput { ctx, payload } = msg else {
        return Ok(());
    };

    let (line_tx, line_rx) = tokio::sync::mpsc::unbounded_channel();
    let relay = tokio::spawn({
        let bus = bus.clone();
        let ctx = ctx.clone();
        let source = source.to_string();
        async move { relay_lines(&bus, &ctx, &source, line_rx).await }
    });

    let (record, report) = executor
        .execute(&ctx.session_id, &payload.scripts, &payload.config, Some(line_tx))
        .await;
    relay.await.ok();

    if let Err(err) = store.upsert_execution(&record, &report).await {
        // Persistence failures are logged, not propagated: the terminal
        // response below is built from the in-memory record regardless
        // (spec.md §4.6 — downstream consumers don't depend on the write).
        tracing::warn!(%err, execution_id = %record.execution_id, "failed to persist execution record");
    }

    let level = if matches!(report.status, qa_core_utils::ExecutionStatus::Completed) {
        LogLevel::Info
    } else {
        LogLevel::Error
    };

    let response = StreamResponse::final_text(
        source,
        format!(
            "execution {} finished: {} passed / {} total",
            record.execution_id, report.totals.passed, report.totals.total
        ),
    )
    .with_result(serde_json::json!(report));

    bus.publish(
        TopicType::ExecutionOutput,
        TypedMessage::ExecutionOutput {
            ctx: ctx.propagate(source),
            payload: response,
        },
    )
    .await
    .map_err(qa_core_utils::CoreError::from)?;

    bus.publish(
        TopicType::LogRecord,
        TypedMessage::LogRecord {
            ctx: ctx.propagate(source),
            payload: LogRecord {
                session_id: ctx.session_id.clone(),
                source: source.to_string(),
                level,
                message: format!(
                    "execution {}: {}/{} passed",
                    record.execution_id, report.totals.passed, report.totals.total
                ),
                metadata: serde_json::Map::new(),
                operation: "execute".to_string(),
                timestamp: qa_core_utils::now(),
            },
        },
    )
    .await
    .map_err(qa_core_utils::CoreError::from)?;

    Ok(())
}

pub struct ExecutorAgent {
    bus: SharedBus,
    executor: Arc<ScriptExecutor>,
    store: Arc<dyn PersistenceStore>,
}

impl ExecutorAgent {
    pub fn new(bus: SharedBus, executor: Arc<ScriptExecutor>, store: Arc<dyn PersistenceStore>) -> Self {
        Self { bus, executor, store }
    }
}

#[async_trait]
impl Agent for ExecutorAgent {
    fn agent_type(&self) -> AgentType {
        AgentType::Executor
    }

    async fn handle(&self, msg: TypedMessage) -> AgentResult {
        run_and_publish(&self.executor, &self.bus, self.store.as_ref(), "executor", msg).await
    }
}

pub struct PlaywrightExecutorAgent {
    bus: SharedBus,
    executor: Arc<ScriptExecutor>,
    store: Arc<dyn PersistenceStore>,
}

impl PlaywrightExecutorAgent {
    pub fn new(bus: SharedBus, executor: Arc<ScriptExecutor>, store: Arc<dyn PersistenceStore>) -> Self {
        Self { bus, executor, store }
    }
}

#[async_trait]
impl Agent for PlaywrightExecutorAgent {
    fn agent_type(&self) -> AgentType {
        AgentType::PlaywrightExecutor
    }

    async fn handle(&self, msg: TypedMessage) -> AgentResult {
        run_and_publish(&self.executor, &self.bus, self.store.as_ref(), "playwright_executor", msg).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qa_core_agents::persistence_store::InMemoryPersistenceStore;
    use qa_core_bus::MessageBus;
    use qa_core_tooling::config::ExecutorSettings;
    use qa_core_utils::{ExecutionConfig, ExecutionInput, MessageContext};

    fn executor(root: std::path::PathBuf) -> Arc<ScriptExecutor> {
        Arc::new(ScriptExecutor::new(ExecutorSettings {
            workspace_root: Some(root),
            execution_timeout_secs: 30,
            batch_id: None,
        }))
    }

    #[tokio::test]
    async fn test_executor_agent_publishes_execution_output() {
        let bus = Arc::new(MessageBus::new());
        let mut output_rx = bus
            .subscribe(TopicType::ExecutionOutput, AgentType::StreamCollector)
            .unwrap();
        let mut log_rx = bus.subscribe(TopicType::LogRecord, AgentType::LogRecorder).unwrap();

        let store = Arc::new(InMemoryPersistenceStore::new());
        let root = std::env::temp_dir().join(format!("qa-core-executor-agent-{}", qa_core_utils::new_id()));
        let agent = ExecutorAgent::new(bus.clone(), executor(root.clone()), store.clone());

        let msg = TypedMessage::ExecutionInput {
            ctx: MessageContext::new("script_generator"),
            payload: ExecutionInput {
                scripts: Vec::new(),
                config: ExecutionConfig::default(),
            },
        };
        agent.handle(msg).await.unwrap();

        assert!(output_rx.try_recv().is_ok());
        assert!(log_rx.try_recv().is_ok());
        assert_eq!(store.execution_count(), 1);
        std::fs::remove_dir_all(&root).ok();
    }

    #[tokio::test]
    async fn test_unrelated_message_is_ignored() {
        let bus = Arc::new(MessageBus::new());
        let root = std::env::temp_dir().join(format!("qa-core-executor-agent-noop-{}", qa_core_utils::new_id()));
        let store = Arc::new(InMemoryPersistenceStore::new());
        let agent = ExecutorAgent::new(bus, executor(root), store);
        let msg = TypedMessage::LogRecord {
            ctx: MessageContext::new("x"),
            payload: LogRecord {
                session_id: "s".to_string(),
                source: "x".to_string(),
                level: LogLevel::Info,
                message: "noop".to_string(),
                metadata: serde_json::Map::new(),
                operation: "noop".to_string(),
                timestamp: qa_core_utils::now(),
            },
        };
        assert!(agent.handle(msg).await.is_ok());
    }
}
