//! Persistence Agent: upserts parse/script outputs, never aborting the
//! pipeline on a storage failure (spec.md §4.6 — downstream agents already
//! run from the in-memory message, not the database).

use async_trait::async_trait;
use std::sync::Arc;

use qa_core_agent_runtime::{Agent, AgentResult};
use qa_core_bus::SharedBus;
use qa_core_llm::ChatModel;
use qa_core_utils::{AgentType, TypedMessage};

use crate::base_agent::BaseAgent;
use crate::persistence_store::PersistenceStore;

pub struct PersistenceAgent {
    base: BaseAgent,
    store: Arc<dyn PersistenceStore>,
}

impl PersistenceAgent {
    pub fn new(bus: SharedBus, model_client: Box<dyn ChatModel>, store: Arc<dyn PersistenceStore>) -> Self {
        Self {
            base: BaseAgent::new(AgentType::Persistence, bus, model_client),
            store,
        }
    }
}

#[async_trait]
impl Agent for PersistenceAgent {
    fn agent_type(&self) -> AgentType {
        AgentType::Persistence
    }

    async fn handle(&self, msg: TypedMessage) -> AgentResult {
        let monitor = self.base.start_monitor();

        let result = match &msg {
            TypedMessage::ParseOutput { ctx, payload } => {
                self.store.upsert_parse_output(&ctx.session_id, payload).await
            }
            TypedMessage::ScriptGenerationOutput { ctx, payload } => {
                self.store.upsert_script_output(&ctx.session_id, payload).await
            }
            _ => Ok(()),
        };

        match result {
            Ok(()) => {
                self.base.end_monitor(monitor, true);
                Ok(())
            }
            Err(err) => {
                // Persistence failures are logged and surfaced but never
                // propagated as a handler error: the pipeline already ran
                // from the in-memory message.
                self.base.handle_exception(msg.ctx(), monitor, &err);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qa_core_llm::remote::mock::MockChatModel;
    use qa_core_utils::{DocumentFormat, MessageContext, ParseOutput};

    use crate::persistence_store::InMemoryPersistenceStore;

    #[tokio::test]
    async fn test_handle_parse_output_upserts() {
        let store = Arc::new(InMemoryPersistenceStore::new());
        let agent = PersistenceAgent::new(
            Arc::new(qa_core_bus::MessageBus::new()),
            Box::new(MockChatModel::default()),
            store.clone(),
        );
        let msg = TypedMessage::ParseOutput {
            ctx: MessageContext::new("doc_parser"),
            payload: ParseOutput::empty(DocumentFormat::OpenApi),
        };
        agent.handle(msg).await.unwrap();
        assert_eq!(store.parse_output_count(), 1);
    }

    #[tokio::test]
    async fn test_unrelated_message_is_ignored() {
        let store = Arc::new(InMemoryPersistenceStore::new());
        let agent = PersistenceAgent::new(
            Arc::new(qa_core_bus::MessageBus::new()),
            Box::new(MockChatModel::default()),
            store.clone(),
        );
        let msg = TypedMessage::ParseInput {
            ctx: MessageContext::new("x"),
            payload: qa_core_utils::ParseInput { content: Vec::new(), format_hint: "auto".to_string() },
        };
        assert!(agent.handle(msg).await.is_ok());
        assert_eq!(store.parse_output_count(), 0);
    }
}
