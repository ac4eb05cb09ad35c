//! LLM provider implementations for the orchestration core.
//!
//! This crate provides concrete implementations of the `ChatModel` trait
//! for the OpenAI-compatible providers the pipeline agents are configured
//! against, plus a mock provider for tests and offline development.
//!
//! # Providers
//!
//! - **Qwen** / **Qwen-VL** - Alibaba's Qwen models (text and vision)
//! - **GLM** - Zhipu's GLM models
//! - **UI-TARS** - ByteDance's UI-grounding vision-language model
//! - **Deepseek** - Deepseek models including R1 (thinking model)
//! - **OpenAI** - OpenAI models (GPT-4, o1, etc.), used as a general fallback
//! - **Mock** - an in-memory stand-in used when `AI_MOCK_MODE` is set
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use llm::remote::DeepseekClient;
//! use llm::config::RemoteLlmConfig;
//! use llm::{ChatModel, ChatRequest, Message};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = RemoteLlmConfig::from_env(
//!         "DEEPSEEK_API_KEY",
//!         "https://api.deepseek.com",
//!         "deepseek-reasoner"
//!     )?;
//!     let client = DeepseekClient::new(config);
//!
//!     let request = ChatRequest::new(vec![Message::human("What is Rust?")]);
//!     let response = client.chat(request).await?;
//!     println!("Response: {}", response.message.text().unwrap());
//!
//!     Ok(())
//! }
//! ```

pub mod chat;
pub mod config;
pub mod error;
pub mod message;
pub mod provider_utils;
pub mod tools;
pub mod traits;

#[macro_use]
mod provider_macros;

pub mod remote;

pub use chat::{
    ChatConfig, ChatRequest, ChatResponse, ChatStreamResponse, ReasoningContent, ReasoningMode,
    UsageMetadata,
};
pub use config::RemoteLlmConfig;
pub use error::{LlmError, Result};
pub use message::{Message, MessageContent, MessageRole};
pub use provider_utils::{ModelInfo, ProviderUtils};
pub use tools::{ToolCall, ToolDefinition, ToolResult};
pub use traits::ChatModel;
