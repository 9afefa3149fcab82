//! Named JSON documents in the key-value store.

use std::sync::Arc;

use zeno_types::{ConfigDocKind, DataConfig};

use crate::kv::KvStore;
use crate::Result;

/// Accessor for the four fixed config documents.
///
/// Documents are plain JSON with no versioning field; concurrent writers
/// race and the last writer wins.
#[derive(Clone)]
pub struct ConfigStore {
    kv: Arc<dyn KvStore>,
}

impl ConfigStore {
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self { kv }
    }

    pub async fn get(&self, kind: ConfigDocKind) -> Result<Option<serde_json::Value>> {
        match self.kv.get(kind.as_key()).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    pub async fn set(&self, kind: ConfigDocKind, value: &serde_json::Value) -> Result<()> {
        self.kv
            .set(kind.as_key(), &serde_json::to_string(value)?)
            .await
    }

    pub async fn delete(&self, kind: ConfigDocKind) -> Result<bool> {
        self.kv.del(kind.as_key()).await
    }

    /// The `data-config` document, or an empty one when unset.
    pub async fn data_config(&self) -> Result<DataConfig> {
        match self.kv.get(ConfigDocKind::Data.as_key()).await? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(DataConfig::default()),
        }
    }

    pub async fn save_data_config(&self, config: &DataConfig) -> Result<()> {
        self.kv
            .set(ConfigDocKind::Data.as_key(), &serde_json::to_string(config)?)
            .await
    }
}
