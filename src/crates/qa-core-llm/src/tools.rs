//! Tool-calling types shared by chat requests/responses.
//!
//! None of the providers in this crate currently issue tool calls against
//! domain agents, but the wire format accepts them so a future agent can
//! opt in without changing the `ChatModel` trait surface.

use serde::{Deserialize, Serialize};

/// Describes a callable tool to the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: serde_json::Value,
}

/// The result of executing a tool call, fed back to the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    pub tool_call_id: String,
    pub content: String,
    #[serde(default)]
    pub is_error: bool,
}
