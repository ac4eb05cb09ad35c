//! `Factory`: constructs agent instances from a registry of builder closures
//! keyed by [`AgentType`], and owns the process-wide singleton instance.

use dashmap::DashMap;
use std::sync::{Arc, OnceLock};

use qa_core_bus::{SharedBus, StreamCollector, StreamConsumer};
use qa_core_tooling::config::CoreConfig;
use qa_core_utils::{AgentType, CoreError};

use crate::agent_trait::Agent;
use crate::runtime::Runtime;

type Constructor = Box<dyn Fn(SharedBus, Arc<CoreConfig>) -> Arc<dyn Agent> + Send + Sync>;

/// Holds one builder closure per [`AgentType`] plus the bus/config every
/// builder closes over. `register_all` drives a [`Runtime`] from the
/// registry; `global`/`init` expose a process-wide singleton since most
/// binaries only ever need one factory.
pub struct Factory {
    bus: SharedBus,
    config: Arc<CoreConfig>,
    constructors: DashMap<AgentType, Constructor>,
}

static GLOBAL: OnceLock<Factory> = OnceLock::new();

impl Factory {
    pub fn new(bus: SharedBus, config: CoreConfig) -> Self {
        Self {
            bus,
            config: Arc::new(config),
            constructors: DashMap::new(),
        }
    }

    pub fn bus(&self) -> SharedBus {
        self.bus.clone()
    }

    pub fn config(&self) -> Arc<CoreConfig> {
        self.config.clone()
    }

    /// Register a builder closure for `agent_type`. Overwrites any existing
    /// builder for the same type — last registration wins, unlike
    /// [`Runtime::register`] which is idempotent on the live instance.
    pub fn register_constructor<F>(&self, agent_type: AgentType, ctor: F)
    where
        F: Fn(SharedBus, Arc<CoreConfig>) -> Arc<dyn Agent> + Send + Sync + 'static,
    {
        self.constructors.insert(agent_type, Box::new(ctor));
    }

    /// Build one agent instance via its registered constructor.
    pub fn create(&self, agent_type: AgentType) -> Result<Arc<dyn Agent>, CoreError> {
        let ctor = self.constructors.get(&agent_type).ok_or_else(|| {
            CoreError::configuration(format!("no constructor registered for {agent_type}"))
        })?;
        Ok(ctor(self.bus.clone(), self.config.clone()))
    }

    /// Build and register every known agent type onto `runtime`. A type with
    /// no registered constructor is skipped and logged, not treated as fatal —
    /// callers that only need a subset of agents running can still use the
    /// shared registry.
    pub fn register_all(&self, runtime: &Runtime) {
        for agent_type in AgentType::ALL {
            match self.create(*agent_type) {
                Ok(agent) => {
                    runtime.register(agent);
                }
                Err(err) => {
                    tracing::debug!(%agent_type, %err, "skipping agent type with no constructor");
                }
            }
        }
    }

    /// Spawn the stream collector's bus-drain loop as a background task. The
    /// collector is not a [`Runtime`]-managed agent since it has no
    /// request/response topic pair of its own, only the single stream-output
    /// subscription.
    pub fn spawn_stream_collector<C>(&self, consumer: C) -> tokio::task::JoinHandle<()>
    where
        C: StreamConsumer + 'static,
    {
        let bus = self.bus.clone();
        tokio::spawn(async move {
            let collector = StreamCollector::new(consumer);
            collector.run(&bus, AgentType::StreamCollector).await;
        })
    }

    /// Rebuild `agent_type` via its registered constructor and hand the fresh
    /// instance to `runtime.restart`'s companion path: since `Runtime::restart`
    /// reuses the already-registered instance, a full rebuild instead
    /// re-registers from scratch, replacing the old instance in the runtime.
    pub fn rebuild(&self, runtime: &Runtime, agent_type: AgentType) -> Result<(), CoreError> {
        let agent = self.create(agent_type)?;
        runtime.register(agent);
        Ok(())
    }

    /// Initialize the process-wide singleton. Must be called at most once;
    /// subsequent calls are rejected since they would silently orphan the
    /// bus/config the first caller wired up.
    pub fn init(bus: SharedBus, config: CoreConfig) -> Result<&'static Factory, CoreError> {
        GLOBAL
            .set(Factory::new(bus, config))
            .map_err(|_| CoreError::configuration("Factory::init called more than once"))?;
        Ok(GLOBAL.get().expect("just set"))
    }

    /// Access the process-wide singleton. Panics if [`Factory::init`] has not
    /// been called yet — this mirrors the teacher's eager-singleton pattern,
    /// where accessing an unconfigured global is a programming error, not a
    /// recoverable one.
    pub fn global() -> &'static Factory {
        GLOBAL.get().expect("Factory::init must be called before Factory::global")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qa_core_bus::MessageBus;
    use qa_core_utils::TypedMessage;

    struct StubAgent(AgentType);

    #[async_trait::async_trait]
    impl Agent for StubAgent {
        fn agent_type(&self) -> AgentType {
            self.0
        }

        async fn handle(&self, _msg: TypedMessage) -> crate::agent_trait::AgentResult {
            Ok(())
        }
    }

    #[test]
    fn test_create_without_constructor_errors() {
        let factory = Factory::new(Arc::new(MessageBus::new()), CoreConfig::default());
        assert!(factory.create(AgentType::DocParser).is_err());
    }

    #[test]
    fn test_register_and_create() {
        let factory = Factory::new(Arc::new(MessageBus::new()), CoreConfig::default());
        factory.register_constructor(AgentType::DocParser, |_bus, _cfg| {
            Arc::new(StubAgent(AgentType::DocParser)) as Arc<dyn Agent>
        });
        let agent = factory.create(AgentType::DocParser).unwrap();
        assert_eq!(agent.agent_type(), AgentType::DocParser);
    }

    #[test]
    fn test_last_registration_wins() {
        let factory = Factory::new(Arc::new(MessageBus::new()), CoreConfig::default());
        factory.register_constructor(AgentType::DocParser, |_bus, _cfg| {
            Arc::new(StubAgent(AgentType::DocParser)) as Arc<dyn Agent>
        });
        factory.register_constructor(AgentType::DocParser, |_bus, _cfg| {
            Arc::new(StubAgent(AgentType::Analyzer)) as Arc<dyn Agent>
        });
        let agent = factory.create(AgentType::DocParser).unwrap();
        assert_eq!(agent.agent_type(), AgentType::Analyzer);
    }

    #[test]
    fn test_register_all_skips_missing_constructors() {
        let bus = Arc::new(MessageBus::new());
        let factory = Factory::new(bus.clone(), CoreConfig::default());
        factory.register_constructor(AgentType::DocParser, |_bus, _cfg| {
            Arc::new(StubAgent(AgentType::DocParser)) as Arc<dyn Agent>
        });
        let runtime = Runtime::new(bus);
        factory.register_all(&runtime);
        assert_eq!(runtime.health().len(), 1);
    }
}
