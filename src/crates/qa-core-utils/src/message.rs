//! `StreamResponse` and `TypedMessage`: the bus's wire-level payloads.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::context::MessageContext;
use crate::payloads::{
    AnalysisOutput, ExecutionConfig, LogRecord, ParseOutput, ScriptArtifact,
    ScriptGenerationOutput, TestCaseGenerationOutput,
};

/// A partial or final piece of agent output, fanned out to external
/// consumers by the Stream Collector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamResponse {
    pub source: String,
    pub content: String,
    pub is_final: bool,
    pub result: Option<Value>,
}

impl StreamResponse {
    pub fn chunk(source: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            content: content.into(),
            is_final: false,
            result: None,
        }
    }

    pub fn final_text(source: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            content: content.into(),
            is_final: true,
            result: None,
        }
    }

    pub fn with_result(mut self, result: Value) -> Self {
        self.result = Some(result);
        self
    }
}

/// Input to the Doc Parser: a document plus a format hint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParseInput {
    pub content: Vec<u8>,
    pub format_hint: String,
}

/// Input to the Script Generator (and the Executor): endpoints, test cases,
/// execution plan and optional dependencies collapsed into one payload by
/// the upstream agents, kept opaque here since its shape is a Non-goal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionInput {
    pub scripts: Vec<ScriptArtifact>,
    pub config: ExecutionConfig,
}

/// The sealed variant over every message kind the bus dispatches, replacing
/// the source's duck-typed class hierarchy with one tagged enum (spec.md §9).
/// Each variant carries the producer's `MessageContext` alongside its payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum TypedMessage {
    ParseInput {
        ctx: MessageContext,
        payload: ParseInput,
    },
    ParseOutput {
        ctx: MessageContext,
        payload: ParseOutput,
    },
    AnalysisInput {
        ctx: MessageContext,
        payload: ParseOutput,
    },
    AnalysisOutput {
        ctx: MessageContext,
        payload: AnalysisOutput,
    },
    TestCaseGenerationInput {
        ctx: MessageContext,
        payload: AnalysisOutput,
    },
    TestCaseGenerationOutput {
        ctx: MessageContext,
        payload: TestCaseGenerationOutput,
    },
    ScriptGenerationInput {
        ctx: MessageContext,
        payload: TestCaseGenerationOutput,
    },
    ScriptGenerationOutput {
        ctx: MessageContext,
        payload: ScriptGenerationOutput,
    },
    ExecutionInput {
        ctx: MessageContext,
        payload: ExecutionInput,
    },
    ExecutionOutput {
        ctx: MessageContext,
        payload: StreamResponse,
    },
    LogRecord {
        ctx: MessageContext,
        payload: LogRecord,
    },
    StreamResponse {
        ctx: MessageContext,
        payload: StreamResponse,
    },
}

impl TypedMessage {
    /// The correlation context every variant carries.
    pub fn ctx(&self) -> &MessageContext {
        match self {
            TypedMessage::ParseInput { ctx, .. }
            | TypedMessage::ParseOutput { ctx, .. }
            | TypedMessage::AnalysisInput { ctx, .. }
            | TypedMessage::AnalysisOutput { ctx, .. }
            | TypedMessage::TestCaseGenerationInput { ctx, .. }
            | TypedMessage::TestCaseGenerationOutput { ctx, .. }
            | TypedMessage::ScriptGenerationInput { ctx, .. }
            | TypedMessage::ScriptGenerationOutput { ctx, .. }
            | TypedMessage::ExecutionInput { ctx, .. }
            | TypedMessage::ExecutionOutput { ctx, .. }
            | TypedMessage::LogRecord { ctx, .. }
            | TypedMessage::StreamResponse { ctx, .. } => ctx,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payloads::DocumentFormat;

    #[test]
    fn test_serde_tag_round_trip() {
        let ctx = MessageContext::new("doc_parser");
        let msg = TypedMessage::ParseOutput {
            ctx,
            payload: ParseOutput::empty(DocumentFormat::OpenApi),
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"kind\":\"ParseOutput\""));
        let back: TypedMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(back.ctx().sender, "doc_parser");
    }

    #[test]
    fn test_stream_response_final_with_result() {
        let resp = StreamResponse::final_text("executor", "done")
            .with_result(serde_json::json!({"passed": 3}));
        assert!(resp.is_final);
        assert_eq!(resp.result.unwrap()["passed"], 3);
    }
}
