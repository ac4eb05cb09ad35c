//! Request/response envelope for a single chat-completion call.

use crate::message::Message;
use crate::tools::{ToolCall, ToolDefinition};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// How a thinking-capable model's reasoning trace should be handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ReasoningMode {
    /// Discard any reasoning trace, only keep the final answer.
    Disabled,
    /// Provider default behavior.
    #[default]
    Default,
    /// Strip the reasoning trace out of the answer and return it separately.
    Separated,
    /// Request the provider's extended/deep reasoning mode, if supported.
    Extended,
}

impl ReasoningMode {
    /// Whether reasoning content should be captured and surfaced on the response.
    pub fn should_capture(&self) -> bool {
        matches!(self, ReasoningMode::Separated | ReasoningMode::Extended)
    }

    pub fn is_extended(&self) -> bool {
        matches!(self, ReasoningMode::Extended)
    }
}

/// Sampling and tool-use parameters for a chat request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatConfig {
    pub temperature: Option<f32>,
    pub max_tokens: Option<usize>,
    #[serde(default)]
    pub reasoning_mode: ReasoningMode,
    #[serde(default)]
    pub stop_sequences: Vec<String>,
    #[serde(default)]
    pub tools: Vec<ToolDefinition>,
    pub top_p: Option<f32>,
    pub frequency_penalty: Option<f32>,
    pub presence_penalty: Option<f32>,
}

/// A chat-completion request: a message history plus sampling config.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub messages: Vec<Message>,
    pub config: ChatConfig,
}

impl ChatRequest {
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            config: ChatConfig::default(),
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.config.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.config.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_reasoning(mut self, mode: ReasoningMode) -> Self {
        self.config.reasoning_mode = mode;
        self
    }

    pub fn with_stop_sequences(mut self, stop: Vec<String>) -> Self {
        self.config.stop_sequences = stop;
        self
    }

    pub fn with_tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.config.tools = tools;
        self
    }

    pub fn with_top_p(mut self, top_p: f32) -> Self {
        self.config.top_p = Some(top_p);
        self
    }

    pub fn with_frequency_penalty(mut self, penalty: f32) -> Self {
        self.config.frequency_penalty = Some(penalty);
        self
    }

    pub fn with_presence_penalty(mut self, penalty: f32) -> Self {
        self.config.presence_penalty = Some(penalty);
        self
    }
}

/// A captured reasoning trace from a thinking model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReasoningContent {
    pub content: String,
}

impl ReasoningContent {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }
}

/// Token accounting for a completed request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageMetadata {
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
    pub reasoning_tokens: Option<usize>,
}

impl UsageMetadata {
    pub fn new(prompt_tokens: usize, completion_tokens: usize) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            reasoning_tokens: None,
        }
    }

    pub fn with_reasoning(
        prompt_tokens: usize,
        completion_tokens: usize,
        reasoning_tokens: usize,
    ) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            reasoning_tokens: Some(reasoning_tokens),
        }
    }
}

/// The result of a non-streaming chat call.
#[derive(Debug, Clone)]
pub struct ChatResponse {
    pub message: Message,
    pub usage: Option<UsageMetadata>,
    pub reasoning: Option<ReasoningContent>,
    pub metadata: HashMap<String, serde_json::Value>,
}

/// A single chunk of a streamed chat response.
#[derive(Debug, Clone)]
pub struct ChatStreamResponse {
    pub delta: String,
    pub tool_calls: Vec<ToolCall>,
    pub done: bool,
    pub usage: Option<UsageMetadata>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Message;

    #[test]
    fn test_request_builder() {
        let req = ChatRequest::new(vec![Message::human("hi")])
            .with_temperature(0.5)
            .with_max_tokens(128);
        assert_eq!(req.config.temperature, Some(0.5));
        assert_eq!(req.config.max_tokens, Some(128));
    }

    #[test]
    fn test_reasoning_mode_capture() {
        assert!(!ReasoningMode::Disabled.should_capture());
        assert!(!ReasoningMode::Default.should_capture());
        assert!(ReasoningMode::Separated.should_capture());
        assert!(ReasoningMode::Extended.should_capture());
        assert!(ReasoningMode::Extended.is_extended());
    }

    #[test]
    fn test_usage_with_reasoning() {
        let usage = UsageMetadata::with_reasoning(10, 20, 5);
        assert_eq!(usage.reasoning_tokens, Some(5));
    }
}
