//! Qwen-VL client (vision-language variant, OpenAI-compatible chat surface).
//!
//! Image payloads for UI-analysis prompts are assembled by the collaborator
//! that builds the request (screenshot capture is out of scope here); this
//! client only needs to speak the same chat-completions wire format as
//! [`super::qwen::QwenClient`].

use crate::chat::{ChatRequest, ChatResponse, ChatStreamResponse, UsageMetadata};
use crate::config::RemoteLlmConfig;
use crate::error::{LlmError, Result};
use crate::message::{Message, MessageContent, MessageRole};
use crate::traits::ChatModel;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Qwen-VL API client.
#[derive(Clone)]
pub struct QwenVlClient {
    config: RemoteLlmConfig,
    client: Client,
}

impl QwenVlClient {
    pub fn new(config: RemoteLlmConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self { config, client }
    }

    fn convert_message(&self, msg: &Message) -> QwenVlMessage {
        QwenVlMessage {
            role: match &msg.role {
                MessageRole::System => "system".to_string(),
                MessageRole::Human => "user".to_string(),
                MessageRole::Assistant => "assistant".to_string(),
                MessageRole::Tool => "tool".to_string(),
                MessageRole::Custom(role) => role.clone(),
            },
            content: msg.text().unwrap_or("").to_string(),
        }
    }

    fn convert_response(&self, resp: QwenVlResponse) -> ChatResponse {
        let choice = &resp.choices[0];

        let message = Message {
            id: None,
            role: MessageRole::Assistant,
            content: MessageContent::Text(choice.message.content.clone()),
            name: None,
            tool_calls: None,
            tool_call_id: None,
            metadata: None,
        };

        let usage = resp
            .usage
            .as_ref()
            .map(|u| UsageMetadata::new(u.prompt_tokens, u.completion_tokens));

        let mut metadata = HashMap::new();
        metadata.insert("model".to_string(), serde_json::Value::String(resp.model));

        ChatResponse {
            message,
            usage,
            reasoning: None,
            metadata,
        }
    }
}

#[async_trait]
impl ChatModel for QwenVlClient {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        let url = format!("{}/chat/completions", self.config.base_url);

        let messages: Vec<QwenVlMessage> = request
            .messages
            .iter()
            .map(|m| self.convert_message(m))
            .collect();

        let req_body = QwenVlRequest {
            model: self.config.model.clone(),
            messages,
            temperature: request.config.temperature,
            max_tokens: request.config.max_tokens,
            stream: false,
        };

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .json(&req_body)
            .send()
            .await
            .map_err(LlmError::HttpError)?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();

            return Err(if status.as_u16() == 401 {
                LlmError::AuthenticationError(error_text)
            } else if status.as_u16() == 429 {
                LlmError::RateLimitExceeded(error_text)
            } else {
                LlmError::ProviderError(format!("Qwen-VL API error {}: {}", status, error_text))
            });
        }

        let resp: QwenVlResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        Ok(self.convert_response(resp))
    }

    async fn stream(&self, _request: ChatRequest) -> Result<ChatStreamResponse> {
        Err(LlmError::Other(
            "Streaming not yet implemented for Qwen-VL".to_string(),
        ))
    }

    fn clone_box(&self) -> Box<dyn ChatModel> {
        Box::new(self.clone())
    }
}

#[derive(Debug, Serialize)]
struct QwenVlRequest {
    model: String,
    messages: Vec<QwenVlMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<usize>,
    stream: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct QwenVlMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct QwenVlResponse {
    model: String,
    choices: Vec<QwenVlChoice>,
    usage: Option<QwenVlUsage>,
}

#[derive(Debug, Deserialize)]
struct QwenVlChoice {
    message: QwenVlMessage,
}

#[derive(Debug, Deserialize)]
struct QwenVlUsage {
    prompt_tokens: usize,
    completion_tokens: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let config = RemoteLlmConfig::new(
            "test-key",
            "https://dashscope.aliyuncs.com/compatible-mode/v1",
            "qwen-vl-plus",
        );
        let _client = QwenVlClient::new(config);
    }
}
