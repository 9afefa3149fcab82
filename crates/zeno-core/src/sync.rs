//! Embedding synchronization between catalog and embedding store.
//!
//! Embedding generation is throttled by processing tools in fixed-size
//! batches with a fixed delay between batches; that delay is the only
//! backpressure toward the model provider.

use std::time::Duration;

use futures::future::join_all;
use std::sync::Arc;
use zeno_types::{
    content_hash, SyncOp, SyncReport, SyncStats, SyncTask, Tool, ToolEmbedding,
};

use crate::catalog::ToolCatalog;
use crate::embedding::EmbeddingProvider;
use crate::vectors::VectorStore;
use crate::{Result, ZenoError};

pub const SYNC_BATCH_SIZE: usize = 10;
pub const SYNC_BATCH_DELAY: Duration = Duration::from_secs(1);

#[derive(Clone)]
pub struct EmbeddingSync {
    catalog: ToolCatalog,
    vectors: Arc<dyn VectorStore>,
    embeddings: Arc<dyn EmbeddingProvider>,
    batch_delay: Duration,
}

impl EmbeddingSync {
    pub fn new(
        catalog: ToolCatalog,
        vectors: Arc<dyn VectorStore>,
        embeddings: Arc<dyn EmbeddingProvider>,
    ) -> Self {
        Self {
            catalog,
            vectors,
            embeddings,
            batch_delay: SYNC_BATCH_DELAY,
        }
    }

    /// Override the inter-batch delay; tests use zero.
    pub fn with_batch_delay(mut self, delay: Duration) -> Self {
        self.batch_delay = delay;
        self
    }

    /// Compute a fresh embedding row for one tool.
    pub async fn embed_tool(&self, tool: &Tool) -> Result<ToolEmbedding> {
        let vectors = self.embeddings.embed(&[tool.embedding_text()]).await?;
        let embedding = vectors.into_iter().next().ok_or(ZenoError::Upstream {
            service: "openai",
            message: "empty embedding response".to_string(),
        })?;
        Ok(ToolEmbedding::from_tool(tool, embedding))
    }

    /// Apply one outbox task. An upsert for a tool that has since been
    /// deleted degrades to a row delete.
    pub async fn apply(&self, task: &SyncTask) -> Result<()> {
        match task.op {
            SyncOp::Upsert => match self.catalog.get(task.tool_id).await {
                Ok(tool) => {
                    let row = self.embed_tool(&tool).await?;
                    self.vectors.upsert(row).await
                }
                Err(ZenoError::NotFound(_)) => {
                    self.vectors.delete(task.tool_id).await?;
                    Ok(())
                }
                Err(e) => Err(e),
            },
            SyncOp::Delete => {
                self.vectors.delete(task.tool_id).await?;
                Ok(())
            }
        }
    }

    /// Reconcile: embed every catalog tool that has no row yet.
    pub async fn sync_missing(&self) -> Result<SyncReport> {
        let tools = self.catalog.list().await?;
        let mut report = SyncReport {
            scanned: tools.len(),
            ..Default::default()
        };

        let checks = join_all(
            tools
                .iter()
                .map(|tool| async move { self.vectors.exists(tool.id).await }),
        )
        .await;

        let mut missing = Vec::new();
        for (tool, check) in tools.into_iter().zip(checks) {
            match check {
                Ok(true) => report.already_synced += 1,
                Ok(false) => missing.push(tool),
                Err(e) => {
                    tracing::warn!(target: "zeno::sync", "Existence check for {} failed: {}", tool.id, e);
                    report.failed.push(tool.id);
                }
            }
        }

        self.embed_batches(&missing, &mut report).await;
        tracing::info!(
            target: "zeno::sync",
            "Reconciled: {} scanned, {} synced, {} failed",
            report.scanned,
            report.synced,
            report.failed.len()
        );
        Ok(report)
    }

    /// Regenerate every embedding unconditionally.
    pub async fn force_resync(&self) -> Result<SyncReport> {
        let tools = self.catalog.list().await?;
        let mut report = SyncReport {
            scanned: tools.len(),
            ..Default::default()
        };
        self.embed_batches(&tools, &mut report).await;
        tracing::info!(
            target: "zeno::sync",
            "Force resync: {} scanned, {} synced, {} failed",
            report.scanned,
            report.synced,
            report.failed.len()
        );
        Ok(report)
    }

    /// Embed and upsert in throttled batches. Failures are recorded per
    /// tool, not propagated; a reconcile run finishes what it can.
    async fn embed_batches(&self, tools: &[Tool], report: &mut SyncReport) {
        let mut batches = tools.chunks(SYNC_BATCH_SIZE).peekable();
        while let Some(batch) = batches.next() {
            let texts: Vec<String> = batch.iter().map(|t| t.embedding_text()).collect();
            match self.embeddings.embed(&texts).await {
                Ok(vectors) => {
                    for (tool, embedding) in batch.iter().zip(vectors) {
                        let row = ToolEmbedding::from_tool(tool, embedding);
                        match self.vectors.upsert(row).await {
                            Ok(()) => report.synced += 1,
                            Err(e) => {
                                tracing::warn!(target: "zeno::sync", "Upsert for {} failed: {}", tool.id, e);
                                report.failed.push(tool.id);
                            }
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(target: "zeno::sync", "Batch embedding failed: {}", e);
                    report.failed.extend(batch.iter().map(|t| t.id));
                }
            }

            if batches.peek().is_some() && !self.batch_delay.is_zero() {
                tokio::time::sleep(self.batch_delay).await;
            }
        }
    }

    /// Drift statistics: coverage plus rows whose stored content hash no
    /// longer matches the catalog text.
    pub async fn stats(&self) -> Result<SyncStats> {
        let tools = self.catalog.list().await?;
        let index = self.vectors.index().await?;

        let mut missing = Vec::new();
        let mut stale = 0;
        for tool in &tools {
            match index.get(&tool.id) {
                None => missing.push(tool.id),
                Some(hash) if *hash != content_hash(&tool.embedding_text()) => stale += 1,
                Some(_) => {}
            }
        }

        let catalog_count = tools.len();
        let coverage_percent = if catalog_count == 0 {
            100.0
        } else {
            (catalog_count - missing.len()) as f64 * 100.0 / catalog_count as f64
        };

        Ok(SyncStats {
            catalog_count,
            embedded_count: index.len(),
            missing,
            stale,
            coverage_percent,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config_store::ConfigStore;
    use crate::kv::MemoryKv;
    use crate::vectors::MemoryVectors;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use zeno_types::{NewTool, ToolUpdate};

    struct CountingEmbeddings {
        calls: AtomicUsize,
        fail: AtomicBool,
    }

    impl CountingEmbeddings {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail: AtomicBool::new(false),
            }
        }
    }

    #[async_trait]
    impl EmbeddingProvider for CountingEmbeddings {
        fn model_name(&self) -> &str {
            "counting"
        }
        fn dims(&self) -> usize {
            2
        }
        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                return Err(ZenoError::Upstream {
                    service: "openai",
                    message: "boom".to_string(),
                });
            }
            Ok(texts
                .iter()
                .map(|t| vec![t.len() as f32, 1.0])
                .collect())
        }
    }

    struct Fixture {
        catalog: ToolCatalog,
        vectors: Arc<MemoryVectors>,
        embeddings: Arc<CountingEmbeddings>,
        sync: EmbeddingSync,
    }

    fn fixture() -> Fixture {
        let catalog = ToolCatalog::new(ConfigStore::new(Arc::new(MemoryKv::new())));
        let vectors = Arc::new(MemoryVectors::new());
        let embeddings = Arc::new(CountingEmbeddings::new());
        let sync = EmbeddingSync::new(catalog.clone(), vectors.clone(), embeddings.clone())
            .with_batch_delay(Duration::ZERO);
        Fixture {
            catalog,
            vectors,
            embeddings,
            sync,
        }
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
    async fn sync_missing_embeds_only_unsynced_tools() {
        let f = fixture();
        let a = f.catalog.create(new_tool("A")).await.unwrap();
        let b = f.catalog.create(new_tool("B")).await.unwrap();

        let row = f.sync.embed_tool(&a).await.unwrap();
        f.vectors.upsert(row).await.unwrap();

        let report = f.sync.sync_missing().await.unwrap();
        assert_eq!(report.scanned, 2);
        assert_eq!(report.already_synced, 1);
        assert_eq!(report.synced, 1);
        assert!(report.failed.is_empty());
        assert!(f.vectors.exists(b.id).await.unwrap());
    }

    #[tokio::test]
    async fn failed_batch_is_reported_not_fatal() {
        let f = fixture();
        f.catalog.create(new_tool("A")).await.unwrap();
        f.embeddings.fail.store(true, Ordering::SeqCst);

        let report = f.sync.sync_missing().await.unwrap();
        assert_eq!(report.synced, 0);
        assert_eq!(report.failed.len(), 1);
    }

    #[tokio::test]
    async fn stats_track_missing_and_stale() {
        let f = fixture();
        let a = f.catalog.create(new_tool("A")).await.unwrap();
        f.catalog.create(new_tool("B")).await.unwrap();

        let row = f.sync.embed_tool(&a).await.unwrap();
        f.vectors.upsert(row).await.unwrap();

        let stats = f.sync.stats().await.unwrap();
        assert_eq!(stats.catalog_count, 2);
        assert_eq!(stats.embedded_count, 1);
        assert_eq!(stats.missing.len(), 1);
        assert_eq!(stats.stale, 0);
        assert!((stats.coverage_percent - 50.0).abs() < 1e-9);

        // Editing the tool text makes its row stale until resynced.
        f.catalog
            .update(
                a.id,
                ToolUpdate {
                    description: Some("rewritten".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let stats = f.sync.stats().await.unwrap();
        assert_eq!(stats.stale, 1);

        f.sync.force_resync().await.unwrap();
        let stats = f.sync.stats().await.unwrap();
        assert_eq!(stats.stale, 0);
        assert_eq!(stats.missing.len(), 0);
        assert!((stats.coverage_percent - 100.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn apply_upsert_for_deleted_tool_removes_row() {
        let f = fixture();
        let a = f.catalog.create(new_tool("A")).await.unwrap();
        let row = f.sync.embed_tool(&a).await.unwrap();
        f.vectors.upsert(row).await.unwrap();
        f.catalog.delete(a.id).await.unwrap();

        let task = SyncTask::new(a.id, SyncOp::Upsert);
        f.sync.apply(&task).await.unwrap();
        assert!(!f.vectors.exists(a.id).await.unwrap());
    }

    #[tokio::test]
    async fn force_resync_batches_requests() {
        let f = fixture();
        for i in 0..12 {
            f.catalog.create(new_tool(&format!("T{i}"))).await.unwrap();
        }

        f.embeddings.calls.store(0, Ordering::SeqCst);
        let report = f.sync.force_resync().await.unwrap();
        assert_eq!(report.synced, 12);
        // 12 tools at a batch size of 10 means two provider calls.
        assert_eq!(f.embeddings.calls.load(Ordering::SeqCst), 2);
    }
}
