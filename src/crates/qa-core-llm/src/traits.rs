//! The `ChatModel` trait every provider client implements.

use crate::chat::{ChatRequest, ChatResponse, ChatStreamResponse};
use crate::error::Result;
use async_trait::async_trait;

/// A chat-completion capable model client.
///
/// Implementors must be cloneable into a trait object (`clone_box`) so that
/// a `Box<dyn ChatModel>` can be shared across agents without generics
/// leaking into every call site.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse>;

    async fn stream(&self, request: ChatRequest) -> Result<ChatStreamResponse>;

    fn clone_box(&self) -> Box<dyn ChatModel>;
}

impl Clone for Box<dyn ChatModel> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}
