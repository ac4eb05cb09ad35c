//! Orchestrator server binary
//!
//! Wires the message bus, every pipeline agent, and the agent runtime
//! together, then serves the REST/WebSocket API over them.

use std::net::SocketAddr;
use std::sync::Arc;

use qa_core_agent_runtime::{Factory, Runtime};
use qa_core_agents::persistence_store::PersistenceStore;
use qa_core_agents::{
    AnalyzerAgent, DocParserAgent, LogRecorderAgent, PersistenceAgent,
    ScriptGeneratorAgent, TestCaseGeneratorAgent, YamlGeneratorAgent,
};
use qa_core_bus::MessageBus;
use qa_core_executor::agent::{ExecutorAgent, PlaywrightExecutorAgent};
use qa_core_executor::ScriptExecutor;
use qa_core_llm::remote::{
    DeepseekClient, GlmClient, MockChatModel, OpenAiClient, QwenClient, QwenVlClient, UiTarsClient,
};
use qa_core_llm::{ChatModel, RemoteLlmConfig};
use qa_core_tooling::config::{CoreConfig, ModelProvider};
use qa_core_utils::{new_id, AgentType};

use qa_orchestrator::api::routes::{create_router, AppState};
use qa_orchestrator::api::ws::BroadcastState;
use qa_orchestrator::db::{DatabaseConnection, SqlitePersistenceStore};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let rust_log = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt().with_env_filter(rust_log).init();

    tracing::info!("Loading configuration from environment");
    let config = CoreConfig::from_environment()?;
    tracing::info!(
        mock_mode = config.mock_mode,
        provider = ?config.model_provider,
        "configuration loaded"
    );

    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite::memory:".to_string());
    tracing::info!("Connecting to database: {}", database_url);
    let db = DatabaseConnection::new(&database_url).await?;
    tracing::info!("Running database migrations");
    db.run_migrations().await?;
    db.health_check().await?;

    let persistence_store = Arc::new(SqlitePersistenceStore::new(db.pool().clone()));
    persistence_store.ensure_schema().await?;

    let bus = Arc::new(MessageBus::new());
    let runtime = Arc::new(Runtime::new(bus.clone()));

    let factory = Factory::new(bus.clone(), config.clone());
    register_agents(&factory, &config, persistence_store);
    factory.register_all(&runtime);
    runtime.start().await?;
    tracing::info!("Agent runtime started");

    let broadcast = Arc::new(BroadcastState::new());
    let consumer = qa_orchestrator::api::ws::BroadcastConsumer(broadcast.clone());
    let _collector_handle = factory.spawn_stream_collector(consumer);
    tracing::info!("Stream collector forwarding to WebSocket broadcast");

    let state = AppState {
        db,
        bus,
        runtime,
        broadcast,
        instance_id: new_id(),
    };

    let app = create_router(state);

    let port = std::env::var("PORT")
        .unwrap_or_else(|_| "8080".to_string())
        .parse::<u16>()
        .expect("PORT must be a valid u16");
    let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;

    tracing::info!("Starting orchestrator server on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Orchestrator server shut down gracefully");
    Ok(())
}

/// Builds a chat model client for `provider`, falling back to
/// [`MockChatModel`] when `AI_MOCK_MODE` is set or no API key is configured
/// for the provider (spec.md §6 `AI_MOCK_MODE` behavior).
fn build_chat_model(config: &CoreConfig, provider: ModelProvider) -> Box<dyn ChatModel> {
    if config.mock_mode {
        return Box::new(MockChatModel::default());
    }

    let api_key = match CoreConfig::api_key_for(provider) {
        Ok(Some(key)) => key,
        _ => {
            tracing::warn!(?provider, "no API key configured, falling back to mock model");
            return Box::new(MockChatModel::default());
        }
    };

    match provider {
        ModelProvider::Qwen => Box::new(QwenClient::new(RemoteLlmConfig::new(
            api_key,
            "https://dashscope.aliyuncs.com/compatible-mode/v1",
            "qwen-plus",
        ))),
        ModelProvider::QwenVl => Box::new(QwenVlClient::new(RemoteLlmConfig::new(
            api_key,
            "https://dashscope.aliyuncs.com/compatible-mode/v1",
            "qwen-vl-plus",
        ))),
        ModelProvider::Glm => Box::new(GlmClient::new(RemoteLlmConfig::new(
            api_key,
            "https://open.bigmodel.cn/api/paas/v4",
            "glm-4",
        ))),
        ModelProvider::DeepSeek => Box::new(DeepseekClient::new(RemoteLlmConfig::new(
            api_key,
            "https://api.deepseek.com",
            "deepseek-reasoner",
        ))),
        ModelProvider::UiTars => Box::new(UiTarsClient::new(RemoteLlmConfig::new(
            api_key,
            "https://api.ui-tars.com/v1",
            "ui-tars-72b",
        ))),
        ModelProvider::OpenAi => Box::new(OpenAiClient::new(RemoteLlmConfig::new(
            api_key, "https://api.openai.com/v1", "gpt-4",
        ))),
        ModelProvider::Mock => Box::new(MockChatModel::default()),
    }
}

/// Registers a constructor for every [`AgentType`] the runtime drives.
/// `StreamCollector` is intentionally absent: it runs as a background task
/// via `Factory::spawn_stream_collector`, not as a runtime-managed agent.
fn register_agents(factory: &Factory, config: &CoreConfig, store: Arc<dyn PersistenceStore>) {
    let provider = config.model_provider;

    factory.register_constructor(AgentType::DocParser, move |bus, config| {
        Arc::new(DocParserAgent::new(bus, build_chat_model(&config, provider)))
    });
    factory.register_constructor(AgentType::Analyzer, move |bus, config| {
        Arc::new(AnalyzerAgent::new(bus, build_chat_model(&config, provider)))
    });
    factory.register_constructor(AgentType::TestCaseGenerator, move |bus, config| {
        Arc::new(TestCaseGeneratorAgent::new(
            bus,
            build_chat_model(&config, provider),
        ))
    });
    factory.register_constructor(AgentType::ScriptGenerator, move |bus, config| {
        Arc::new(ScriptGeneratorAgent::new(
            bus,
            build_chat_model(&config, provider),
        ))
    });
    factory.register_constructor(AgentType::YamlGenerator, move |bus, config| {
        Arc::new(YamlGeneratorAgent::new(
            bus,
            build_chat_model(&config, provider),
        ))
    });
    factory.register_constructor(AgentType::LogRecorder, move |bus, config| {
        Arc::new(LogRecorderAgent::new(bus, build_chat_model(&config, provider)))
    });
    {
        let store = store.clone();
        factory.register_constructor(AgentType::Persistence, move |bus, config| {
            Arc::new(PersistenceAgent::new(
                bus,
                build_chat_model(&config, provider),
                store.clone(),
            ))
        });
    }
    {
        let store = store.clone();
        factory.register_constructor(AgentType::Executor, move |bus, config| {
            let executor = Arc::new(ScriptExecutor::new(config.executor.clone()));
            Arc::new(ExecutorAgent::new(bus, executor, store.clone()))
        });
    }
    factory.register_constructor(AgentType::PlaywrightExecutor, move |bus, config| {
        let executor = Arc::new(ScriptExecutor::new(config.executor.clone()));
        Arc::new(PlaywrightExecutorAgent::new(bus, executor, store.clone()))
    });
}

/// Signal for graceful shutdown (Ctrl-C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install CTRL-C signal handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received CTRL-C signal, shutting down");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM signal, shutting down");
        }
    }
}
