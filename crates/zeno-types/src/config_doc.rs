//! Named configuration documents in the key-value store.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Tool;

/// The four fixed document names the app reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigDocKind {
    App,
    Data,
    Content,
    Taxonomy,
}

impl ConfigDocKind {
    pub const ALL: [ConfigDocKind; 4] = [
        ConfigDocKind::App,
        ConfigDocKind::Data,
        ConfigDocKind::Content,
        ConfigDocKind::Taxonomy,
    ];

    /// Storage key of the document.
    pub fn as_key(&self) -> &'static str {
        match self {
            ConfigDocKind::App => "app-config",
            ConfigDocKind::Data => "data-config",
            ConfigDocKind::Content => "content-config",
            ConfigDocKind::Taxonomy => "taxonomy-config",
        }
    }
}

#[derive(Debug, Error)]
#[error("unknown config document: {0}")]
pub struct UnknownConfigDoc(pub String);

impl std::str::FromStr for ConfigDocKind {
    type Err = UnknownConfigDoc;

    /// Accepts the short route form (`data`) and the stored key (`data-config`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "app" | "app-config" => Ok(ConfigDocKind::App),
            "data" | "data-config" => Ok(ConfigDocKind::Data),
            "content" | "content-config" => Ok(ConfigDocKind::Content),
            "taxonomy" | "taxonomy-config" => Ok(ConfigDocKind::Taxonomy),
            other => Err(UnknownConfigDoc(other.to_string())),
        }
    }
}

/// The `data-config` document. The tool catalog lives in `tools`; any
/// sibling fields round-trip untouched through `rest`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default)]
    pub tools: Vec<Tool>,
    #[serde(flatten)]
    pub rest: serde_json::Map<String, serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn kind_parses_both_forms() {
        assert_eq!(
            ConfigDocKind::from_str("data").unwrap(),
            ConfigDocKind::Data
        );
        assert_eq!(
            ConfigDocKind::from_str("taxonomy-config").unwrap(),
            ConfigDocKind::Taxonomy
        );
        assert!(ConfigDocKind::from_str("secrets").is_err());
    }

    #[test]
    fn data_config_preserves_unknown_fields() {
        let raw = serde_json::json!({
            "tools": [],
            "categories": ["a", "b"],
            "heroText": "welcome"
        });
        let parsed: DataConfig = serde_json::from_value(raw).unwrap();
        assert!(parsed.tools.is_empty());
        let back = serde_json::to_value(&parsed).unwrap();
        assert_eq!(back["categories"], serde_json::json!(["a", "b"]));
        assert_eq!(back["heroText"], "welcome");
    }
}
