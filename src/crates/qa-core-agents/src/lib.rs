//! Domain pipeline agents: doc parsing, dependency analysis, test case and
//! script generation, persistence, log recording, and the UI-pipeline YAML
//! generator. Each is a thin composition over [`BaseAgent`] implementing
//! [`qa_core_agent_runtime::Agent`].

pub mod agents;
pub mod base_agent;
pub mod persistence_store;
pub mod rag;

pub use agents::{
    AnalyzerAgent, DocParserAgent, LogRecorderAgent, PersistenceAgent, ScriptGeneratorAgent,
    TestCaseGeneratorAgent, YamlGeneratorAgent,
};
pub use base_agent::{AgentMetrics, BaseAgent, Monitor};
pub use persistence_store::{InMemoryPersistenceStore, PersistenceStore};
pub use rag::{NoRagClient, RagClient, RagContext};
