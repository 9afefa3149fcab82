//! Durable queue of embedding sync tasks.
//!
//! Tool mutations enqueue here before their response is returned; a
//! background worker drains the queue and keeps the embedding store
//! eventually consistent with the catalog. Failed tasks are re-enqueued
//! with a bounded attempt count instead of being dropped silently.

use std::sync::Arc;
use std::time::Duration;

use zeno_types::{SyncOp, SyncTask};

use crate::kv::KvStore;
use crate::Result;

const OUTBOX_KEY: &str = "embeddings:outbox";

/// Attempts before a task is dropped for good.
pub const MAX_ATTEMPTS: u32 = 5;

#[derive(Clone)]
pub struct SyncOutbox {
    kv: Arc<dyn KvStore>,
}

impl SyncOutbox {
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self { kv }
    }

    pub async fn enqueue(&self, tool_id: uuid::Uuid, op: SyncOp) -> Result<SyncTask> {
        let task = SyncTask::new(tool_id, op);
        self.kv
            .rpush(OUTBOX_KEY, &serde_json::to_string(&task)?)
            .await?;
        tracing::debug!(target: "zeno::sync", "Enqueued {:?} for tool {}", op, tool_id);
        Ok(task)
    }

    /// Pop the oldest task. Records that no longer parse are dropped with
    /// an error log rather than wedging the queue.
    pub async fn next(&self) -> Result<Option<SyncTask>> {
        while let Some(raw) = self.kv.lpop(OUTBOX_KEY).await? {
            match serde_json::from_str(&raw) {
                Ok(task) => return Ok(Some(task)),
                Err(e) => {
                    tracing::error!(target: "zeno::sync", "Dropping unparseable outbox entry: {}", e);
                }
            }
        }
        Ok(None)
    }

    /// Re-enqueue a failed task. Returns false when the attempt limit is
    /// reached and the task was dropped.
    pub async fn retry(&self, mut task: SyncTask) -> Result<bool> {
        task.attempts += 1;
        if task.attempts >= MAX_ATTEMPTS {
            tracing::error!(
                target: "zeno::sync",
                "Giving up on {:?} for tool {} after {} attempts",
                task.op,
                task.tool_id,
                task.attempts
            );
            return Ok(false);
        }
        self.kv
            .rpush(OUTBOX_KEY, &serde_json::to_string(&task)?)
            .await?;
        Ok(true)
    }

    /// Delay before retrying a task that has failed `attempts` times:
    /// 1s, 2s, 4s, ... capped at 32s.
    pub fn backoff(attempts: u32) -> Duration {
        Duration::from_secs(1 << attempts.min(5))
    }
}
