//! Tool catalog records.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A cataloged AI resource entry.
///
/// Lives inside the `tools` array of the `data-config` document. The wire
/// field names match the stored JSON, which mixes camelCase and snake_case.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tool {
    /// Stable join key to the embedding store.
    pub id: Uuid,
    pub title: String,
    pub description: String,
    #[serde(rename = "shortDescription", default)]
    pub short_description: String,
    pub url: String,
    /// Free-form kind label (e.g. "assistant", "library").
    #[serde(rename = "type", default)]
    pub tool_type: String,
    #[serde(default)]
    pub tier: String,
    #[serde(default)]
    pub complexity: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub function: String,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub added_by: String,
    pub date_added: DateTime<Utc>,
    pub date_created: DateTime<Utc>,
    /// Refreshed on every update; strictly increases.
    pub date_modified: DateTime<Utc>,
}

impl Tool {
    /// Text fed to the embedding model: title, description, and tags.
    pub fn embedding_text(&self) -> String {
        let mut text = format!("{}\n{}", self.title, self.description);
        if !self.tags.is_empty() {
            text.push('\n');
            text.push_str(&self.tags.join(", "));
        }
        text
    }

    /// Apply a patch, refreshing `date_modified`.
    ///
    /// The new `date_modified` is bumped past the previous one when the
    /// clock has not advanced, so successive updates always order.
    pub fn apply(&mut self, patch: ToolUpdate) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(short_description) = patch.short_description {
            self.short_description = short_description;
        }
        if let Some(url) = patch.url {
            self.url = url;
        }
        if let Some(tool_type) = patch.tool_type {
            self.tool_type = tool_type;
        }
        if let Some(tier) = patch.tier {
            self.tier = tier;
        }
        if let Some(complexity) = patch.complexity {
            self.complexity = complexity;
        }
        if let Some(tags) = patch.tags {
            self.tags = tags;
        }
        if let Some(function) = patch.function {
            self.function = function;
        }
        if let Some(featured) = patch.featured {
            self.featured = featured;
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(added_by) = patch.added_by {
            self.added_by = added_by;
        }

        let now = Utc::now();
        self.date_modified = if now > self.date_modified {
            now
        } else {
            self.date_modified + Duration::milliseconds(1)
        };
    }
}

/// Payload for creating a tool. Title, description, and url are required;
/// the handler rejects them when blank.
#[derive(Debug, Clone, Deserialize)]
pub struct NewTool {
    pub title: String,
    pub description: String,
    pub url: String,
    #[serde(rename = "shortDescription", default)]
    pub short_description: String,
    #[serde(rename = "type", default)]
    pub tool_type: String,
    #[serde(default)]
    pub tier: String,
    #[serde(default)]
    pub complexity: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub function: String,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub added_by: String,
}

impl NewTool {
    /// Materialize a full record with a generated id and fresh timestamps.
    pub fn into_tool(self) -> Tool {
        let now = Utc::now();
        Tool {
            id: Uuid::new_v4(),
            title: self.title,
            description: self.description,
            short_description: self.short_description,
            url: self.url,
            tool_type: self.tool_type,
            tier: self.tier,
            complexity: self.complexity,
            tags: self.tags,
            function: self.function,
            featured: self.featured,
            category: self.category,
            added_by: self.added_by,
            date_added: now,
            date_created: now,
            date_modified: now,
        }
    }
}

/// Partial update; absent fields keep their stored values.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ToolUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "shortDescription")]
    pub short_description: Option<String>,
    pub url: Option<String>,
    #[serde(rename = "type")]
    pub tool_type: Option<String>,
    pub tier: Option<String>,
    pub complexity: Option<String>,
    pub tags: Option<Vec<String>>,
    pub function: Option<String>,
    pub featured: Option<bool>,
    pub category: Option<String>,
    pub added_by: Option<String>,
}
