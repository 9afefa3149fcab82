//! Tool catalog CRUD over the `data-config` document.

use uuid::Uuid;
use zeno_types::{NewTool, Tool, ToolUpdate};

use crate::config_store::ConfigStore;
use crate::{Result, ZenoError};

/// CRUD over the `tools` array nested in `data-config`.
///
/// Every mutation rewrites the whole document; there is no optimistic
/// concurrency, matching the store's last-writer-wins semantics.
#[derive(Clone)]
pub struct ToolCatalog {
    store: ConfigStore,
}

impl ToolCatalog {
    pub fn new(store: ConfigStore) -> Self {
        Self { store }
    }

    pub async fn list(&self) -> Result<Vec<Tool>> {
        Ok(self.store.data_config().await?.tools)
    }

    pub async fn get(&self, id: Uuid) -> Result<Tool> {
        self.store
            .data_config()
            .await?
            .tools
            .into_iter()
            .find(|t| t.id == id)
            .ok_or_else(|| ZenoError::NotFound(format!("tool {id}")))
    }

    /// Create a tool; title, description, and url must be non-blank.
    pub async fn create(&self, input: NewTool) -> Result<Tool> {
        for (field, value) in [
            ("title", &input.title),
            ("description", &input.description),
            ("url", &input.url),
        ] {
            if value.trim().is_empty() {
                return Err(ZenoError::Validation(format!("{field} is required")));
            }
        }

        let tool = input.into_tool();
        let mut config = self.store.data_config().await?;
        config.tools.push(tool.clone());
        self.store.save_data_config(&config).await?;

        tracing::info!(target: "zeno::catalog", "Created tool {} ({})", tool.id, tool.title);
        Ok(tool)
    }

    /// Patch a tool; submitted fields overwrite exactly, `date_modified`
    /// strictly increases.
    pub async fn update(&self, id: Uuid, patch: ToolUpdate) -> Result<Tool> {
        let mut config = self.store.data_config().await?;
        let tool = config
            .tools
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| ZenoError::NotFound(format!("tool {id}")))?;

        tool.apply(patch);
        let updated = tool.clone();
        self.store.save_data_config(&config).await?;

        tracing::info!(target: "zeno::catalog", "Updated tool {}", id);
        Ok(updated)
    }

    /// Delete a tool; an unknown id leaves the catalog untouched.
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let mut config = self.store.data_config().await?;
        let before = config.tools.len();
        config.tools.retain(|t| t.id != id);
        if config.tools.len() == before {
            return Err(ZenoError::NotFound(format!("tool {id}")));
        }
        self.store.save_data_config(&config).await?;

        tracing::info!(target: "zeno::catalog", "Deleted tool {}", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::MemoryKv;
    use std::sync::Arc;

    fn catalog() -> ToolCatalog {
        ToolCatalog::new(ConfigStore::new(Arc::new(MemoryKv::new())))
    }

    fn new_tool(title: &str) -> NewTool {
        NewTool {
            title: title.into(),
            description: "desc".into(),
            url: "https://example.com".into(),
            short_description: String::new(),
            tool_type: String::new(),
            tier: String::new(),
            complexity: String::new(),
            tags: Vec::new(),
            function: String::new(),
            featured: false,
            category: String::new(),
            added_by: String::new(),
        }
    }

    #[tokio::test]
    async fn create_appears_exactly_once_in_listing() {
        let catalog = catalog();
        let tool = catalog.create(new_tool("X")).await.unwrap();

        let listed = catalog.list().await.unwrap();
        assert_eq!(listed.iter().filter(|t| t.id == tool.id).count(), 1);
    }

    #[tokio::test]
    async fn create_rejects_blank_required_fields() {
        let catalog = catalog();
        let mut input = new_tool("ok");
        input.url = "   ".into();
        let err = catalog.create(input).await.unwrap_err();
        assert!(matches!(err, ZenoError::Validation(_)));
        assert!(catalog.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_refreshes_date_modified_monotonically() {
        let catalog = catalog();
        let tool = catalog.create(new_tool("X")).await.unwrap();

        let first = catalog
            .update(
                tool.id,
                ToolUpdate {
                    title: Some("Y".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(first.title, "Y");
        assert!(first.date_modified > tool.date_modified);

        let second = catalog.update(tool.id, ToolUpdate::default()).await.unwrap();
        assert!(second.date_modified > first.date_modified);
    }

    #[tokio::test]
    async fn update_unknown_tool_is_not_found() {
        let catalog = catalog();
        let err = catalog
            .update(Uuid::new_v4(), ToolUpdate::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ZenoError::NotFound(_)));
    }

    #[tokio::test]
    async fn delete_unknown_tool_leaves_catalog_unchanged() {
        let catalog = catalog();
        let tool = catalog.create(new_tool("X")).await.unwrap();

        let err = catalog.delete(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, ZenoError::NotFound(_)));

        let listed = catalog.list().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, tool.id);
    }

    #[tokio::test]
    async fn delete_removes_tool() {
        let catalog = catalog();
        let tool = catalog.create(new_tool("X")).await.unwrap();
        catalog.delete(tool.id).await.unwrap();
        assert!(catalog.list().await.unwrap().is_empty());
        assert!(matches!(
            catalog.get(tool.id).await.unwrap_err(),
            ZenoError::NotFound(_)
        ));
    }
}
