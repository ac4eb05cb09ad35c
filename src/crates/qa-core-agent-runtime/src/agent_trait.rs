//! `Agent`: the shared trait every domain agent implements.
//!
//! Lives in the runtime crate (not `qa-core-agents`) because both the
//! [`crate::runtime::Runtime`] and the [`crate::factory::Factory`] need to
//! name it without depending on the concrete agent implementations.

use async_trait::async_trait;
use qa_core_utils::{AgentType, CoreError, TypedMessage};

pub type AgentResult = Result<(), CoreError>;

/// A long-lived processor bound to one topic, with one handler for every
/// message kind it accepts (spec.md glossary).
#[async_trait]
pub trait Agent: Send + Sync {
    /// The role this instance fulfils; determines its canonical topic.
    fn agent_type(&self) -> AgentType;

    /// Process one message delivered from the bus. A handler that returns an
    /// error is logged with its correlation ids and the agent's error
    /// counter is incremented; the runtime then serves the next message —
    /// a failing handler never stops the dispatch loop.
    async fn handle(&self, msg: TypedMessage) -> AgentResult;

    /// Called once by the runtime before the dispatch loop starts.
    async fn on_start(&self) {}

    /// Called once by the runtime during `stop()`, regardless of whether the
    /// in-flight handler (if any) finished or was aborted.
    async fn on_stop(&self) {}
}
