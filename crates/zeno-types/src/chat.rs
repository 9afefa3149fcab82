//! Chat request/response shapes.

use serde::{Deserialize, Serialize};

use crate::ToolMatch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

/// A user query against the tool catalog.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    /// Prior turns, oldest first.
    #[serde(default)]
    pub history: Vec<ChatMessage>,
    /// Request an incrementally streamed reply instead of a buffered one.
    #[serde(default)]
    pub stream: bool,
}

/// Buffered answer with the retrieval context that produced it.
#[derive(Debug, Clone, Serialize)]
pub struct ChatAnswer {
    pub reply: String,
    /// Retrieved tools in similarity order.
    pub tools: Vec<ToolMatch>,
    pub model: String,
}

/// Availability snapshot for the chat pane.
#[derive(Debug, Clone, Serialize)]
pub struct ChatStatus {
    pub configured: bool,
    pub model: String,
    pub embedded_tools: u64,
}
