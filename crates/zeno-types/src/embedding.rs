//! Embedding store rows and retrieval hits.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::Tool;

/// Vector dimensionality of the embedding store rows.
pub const EMBEDDING_DIMS: usize = 1536;

/// One embedding-store row per tool, keyed by `tool_id`.
///
/// Stored independently of the catalog record; kept eventually consistent
/// by the sync pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolEmbedding {
    pub tool_id: Uuid,
    pub title: String,
    pub description: String,
    #[serde(rename = "type", default)]
    pub tool_type: String,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub skill_level: String,
    #[serde(default)]
    pub url: String,
    /// SHA-256 of the embedding input text; lets drift checks skip the
    /// vector column entirely.
    pub content_hash: String,
    pub embedding: Vec<f32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ToolEmbedding {
    /// Build a row for a tool from its computed vector.
    pub fn from_tool(tool: &Tool, embedding: Vec<f32>) -> Self {
        let now = Utc::now();
        Self {
            tool_id: tool.id,
            title: tool.title.clone(),
            description: tool.description.clone(),
            tool_type: tool.tool_type.clone(),
            categories: if tool.category.is_empty() {
                Vec::new()
            } else {
                vec![tool.category.clone()]
            },
            skill_level: tool.complexity.clone(),
            url: tool.url.clone(),
            content_hash: content_hash(&tool.embedding_text()),
            embedding,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Hex SHA-256 of embedding input text.
pub fn content_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Tool-shaped retrieval hit returned to chat clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolMatch {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub tool_type: String,
    pub url: String,
    pub categories: Vec<String>,
    pub skill_level: String,
    pub similarity: f32,
}

impl ToolMatch {
    /// Build a hit from a stored row and its similarity to the query.
    pub fn from_row(row: &ToolEmbedding, similarity: f32) -> Self {
        Self {
            id: row.tool_id,
            title: row.title.clone(),
            description: row.description.clone(),
            tool_type: row.tool_type.clone(),
            url: row.url.clone(),
            categories: row.categories.clone(),
            skill_level: row.skill_level.clone(),
            similarity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NewTool;

    #[test]
    fn content_hash_is_stable_and_text_sensitive() {
        let a = content_hash("alpha");
        assert_eq!(a, content_hash("alpha"));
        assert_ne!(a, content_hash("beta"));
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn row_from_tool_carries_join_key_and_hash() {
        let tool = NewTool {
            title: "T".into(),
            description: "D".into(),
            url: "https://t".into(),
            short_description: String::new(),
            tool_type: "assistant".into(),
            tier: String::new(),
            complexity: "intermediate".into(),
            tags: vec!["x".into()],
            function: String::new(),
            featured: false,
            category: "research".into(),
            added_by: String::new(),
        }
        .into_tool();

        let row = ToolEmbedding::from_tool(&tool, vec![0.0; 4]);
        assert_eq!(row.tool_id, tool.id);
        assert_eq!(row.skill_level, "intermediate");
        assert_eq!(row.categories, vec!["research".to_string()]);
        assert_eq!(row.content_hash, content_hash(&tool.embedding_text()));
    }
}
