//! External entry points: thin async functions that construct a
//! [`MessageContext`], publish the corresponding [`TypedMessage`] onto the
//! bus, and return the session id immediately. None of them block on
//! pipeline completion — callers that want progress subscribe to the
//! `/ws` endpoint or poll `qa-core-utils::PipelineSession` via the db layer.

use qa_core_bus::SharedBus;
use qa_core_utils::{
    ExecutionConfig, ExecutionInput, MessageContext, ParseInput, ParseOutput, ScriptArtifact,
    TopicType, TypedMessage,
};

use crate::{OrchestratorError, Result};

/// Submit a raw document to the doc-parser pipeline stage.
///
/// `session_id` lets a caller correlate a resubmission (e.g. a retry) with
/// an existing session rather than always minting a fresh one.
pub async fn submit_parse(
    bus: &SharedBus,
    document: Vec<u8>,
    format_hint: impl Into<String>,
    session_id: Option<String>,
) -> Result<String> {
    let mut ctx = MessageContext::new("entrypoint");
    if let Some(session_id) = session_id {
        ctx = ctx.with_session_id(session_id);
    }
    let session_id = ctx.session_id.clone();

    bus.publish(
        TopicType::ParseRequest,
        TypedMessage::ParseInput {
            ctx,
            payload: ParseInput {
                content: document,
                format_hint: format_hint.into(),
            },
        },
    )
    .await?;

    Ok(session_id)
}

/// Submit already-structured UI/API surface data straight to the analyzer,
/// bypassing the doc-parser stage for callers (the UI-testing pipeline's
/// crawler) that already produce a [`ParseOutput`]-shaped payload.
pub async fn submit_ui_analysis(
    bus: &SharedBus,
    payload: ParseOutput,
    session_id: Option<String>,
) -> Result<String> {
    let mut ctx = MessageContext::new("entrypoint");
    if let Some(session_id) = session_id {
        ctx = ctx.with_session_id(session_id);
    }
    let session_id = ctx.session_id.clone();

    bus.publish(
        TopicType::AnalysisRequest,
        TypedMessage::AnalysisInput { ctx, payload },
    )
    .await?;

    Ok(session_id)
}

/// Submit already-generated scripts straight to the executor, bypassing the
/// generation stages for callers that supply their own scripts.
pub async fn submit_execution(
    bus: &SharedBus,
    scripts: Vec<ScriptArtifact>,
    config: ExecutionConfig,
    session_id: Option<String>,
) -> Result<String> {
    let mut ctx = MessageContext::new("entrypoint");
    if let Some(session_id) = session_id {
        ctx = ctx.with_session_id(session_id);
    }
    let session_id = ctx.session_id.clone();

    bus.publish(
        TopicType::ExecutionRequest,
        TypedMessage::ExecutionInput {
            ctx,
            payload: ExecutionInput { scripts, config },
        },
    )
    .await?;

    Ok(session_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use qa_core_bus::MessageBus;
    use qa_core_utils::{AgentType, DocumentFormat};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_submit_parse_publishes_and_returns_session_id() {
        let bus = Arc::new(MessageBus::new());
        let mut rx = bus
            .subscribe(TopicType::ParseRequest, AgentType::DocParser)
            .unwrap();

        let session_id = submit_parse(&bus, b"openapi: 3.0.0".to_vec(), "openapi", None)
            .await
            .unwrap();

        let msg = rx.recv().await.unwrap();
        assert_eq!(msg.ctx().session_id, session_id);
        assert!(matches!(msg, TypedMessage::ParseInput { .. }));
    }

    #[tokio::test]
    async fn test_submit_parse_reuses_given_session_id() {
        let bus = Arc::new(MessageBus::new());
        let _rx = bus
            .subscribe(TopicType::ParseRequest, AgentType::DocParser)
            .unwrap();

        let session_id = submit_parse(&bus, vec![], "openapi", Some("fixed-session".to_string()))
            .await
            .unwrap();

        assert_eq!(session_id, "fixed-session");
    }

    #[tokio::test]
    async fn test_submit_ui_analysis_targets_analysis_request() {
        let bus = Arc::new(MessageBus::new());
        let mut rx = bus
            .subscribe(TopicType::AnalysisRequest, AgentType::Analyzer)
            .unwrap();

        submit_ui_analysis(&bus, ParseOutput::empty(DocumentFormat::OpenApi), None)
            .await
            .unwrap();

        let msg = rx.recv().await.unwrap();
        assert!(matches!(msg, TypedMessage::AnalysisInput { .. }));
    }

    #[tokio::test]
    async fn test_submit_execution_targets_execution_request() {
        let bus = Arc::new(MessageBus::new());
        let mut rx = bus
            .subscribe(TopicType::ExecutionRequest, AgentType::Executor)
            .unwrap();

        submit_execution(&bus, vec![], ExecutionConfig::default(), None)
            .await
            .unwrap();

        let msg = rx.recv().await.unwrap();
        assert!(matches!(msg, TypedMessage::ExecutionInput { .. }));
    }
}
