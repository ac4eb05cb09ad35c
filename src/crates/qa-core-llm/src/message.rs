//! Self-contained chat message types.
//!
//! These mirror the shape of a typical chat-completion message without
//! pulling in a full conversation-history/graph-state framework — this
//! crate only ever sends a handful of messages per call and never merges
//! or trims histories.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The role a message was authored under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    Human,
    Assistant,
    Tool,
    Custom(String),
}

/// Message body. Only plain text is supported; providers in this crate
/// never send images or other multimodal parts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
}

impl MessageContent {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            MessageContent::Text(s) => Some(s),
        }
    }
}

/// A single chat message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Option<String>,
    pub role: MessageRole,
    pub content: MessageContent,
    pub name: Option<String>,
    pub tool_calls: Option<Vec<crate::tools::ToolCall>>,
    pub tool_call_id: Option<String>,
    pub metadata: Option<HashMap<String, serde_json::Value>>,
}

impl Message {
    fn new(role: MessageRole, text: impl Into<String>) -> Self {
        Self {
            id: None,
            role,
            content: MessageContent::Text(text.into()),
            name: None,
            tool_calls: None,
            tool_call_id: None,
            metadata: None,
        }
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self::new(MessageRole::System, text)
    }

    pub fn human(text: impl Into<String>) -> Self {
        Self::new(MessageRole::Human, text)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, text)
    }

    /// Extract plain text content, if any.
    pub fn text(&self) -> Option<&str> {
        self.content.as_text()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_human_message() {
        let msg = Message::human("hello");
        assert_eq!(msg.role, MessageRole::Human);
        assert_eq!(msg.text(), Some("hello"));
    }

    #[test]
    fn test_system_message() {
        let msg = Message::system("be concise");
        assert_eq!(msg.role, MessageRole::System);
    }
}
