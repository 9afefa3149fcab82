//! Tool comments.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A comment on a tool. Append-only; never edited.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    #[serde(rename = "toolId")]
    pub tool_id: Uuid,
    pub name: String,
    pub message: String,
    #[serde(default = "default_priority")]
    pub priority: String,
    pub timestamp: DateTime<Utc>,
    pub ip: String,
}

/// Submission payload; `name` and `message` must be non-blank.
#[derive(Debug, Clone, Deserialize)]
pub struct NewComment {
    #[serde(rename = "toolId")]
    pub tool_id: Uuid,
    pub name: String,
    pub message: String,
    #[serde(default = "default_priority")]
    pub priority: String,
}

fn default_priority() -> String {
    "normal".to_string()
}
