//! In-memory mock provider, selected when `AI_MOCK_MODE=true` or no provider
//! key is configured.

use crate::chat::{ChatRequest, ChatResponse, ChatStreamResponse, UsageMetadata};
use crate::error::{LlmError, Result};
use crate::message::{Message, MessageContent, MessageRole};
use crate::traits::ChatModel;
use async_trait::async_trait;
use std::collections::HashMap;

/// Returns a fixed or templated response without making any network call.
///
/// Useful for tests and for running the pipeline with `AI_MOCK_MODE=true`
/// when no real provider key is configured.
#[derive(Clone)]
pub struct MockChatModel {
    response_text: String,
}

impl MockChatModel {
    pub fn new(response_text: impl Into<String>) -> Self {
        Self {
            response_text: response_text.into(),
        }
    }
}

impl Default for MockChatModel {
    fn default() -> Self {
        Self::new(r#"{"status": "completed", "result": "mock response"}"#)
    }
}

#[async_trait]
impl ChatModel for MockChatModel {
    async fn chat(&self, _request: ChatRequest) -> Result<ChatResponse> {
        Ok(ChatResponse {
            message: Message {
                id: None,
                role: MessageRole::Assistant,
                content: MessageContent::Text(self.response_text.clone()),
                name: None,
                tool_calls: None,
                tool_call_id: None,
                metadata: None,
            },
            usage: Some(UsageMetadata::new(0, 0)),
            reasoning: None,
            metadata: HashMap::new(),
        })
    }

    async fn stream(&self, _request: ChatRequest) -> Result<ChatStreamResponse> {
        Err(LlmError::Other(
            "Streaming not supported by the mock provider".to_string(),
        ))
    }

    fn clone_box(&self) -> Box<dyn ChatModel> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_returns_configured_response() {
        let model = MockChatModel::new("hello from mock");
        let response = model
            .chat(ChatRequest::new(vec![Message::human("hi")]))
            .await
            .unwrap();
        assert_eq!(response.message.text(), Some("hello from mock"));
    }

    #[tokio::test]
    async fn test_mock_default_is_valid_json() {
        let model = MockChatModel::default();
        let response = model
            .chat(ChatRequest::new(vec![Message::human("hi")]))
            .await
            .unwrap();
        let text = response.message.text().unwrap();
        let _: serde_json::Value = serde_json::from_str(text).unwrap();
    }
}
