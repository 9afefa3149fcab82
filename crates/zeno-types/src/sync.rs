//! Embedding sync tasks and reports.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What the sync worker should do for a tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncOp {
    /// Recompute the embedding and upsert the row.
    Upsert,
    /// Remove the row for a deleted tool.
    Delete,
}

/// One queued sync task in the outbox.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncTask {
    pub id: Uuid,
    pub tool_id: Uuid,
    pub op: SyncOp,
    /// Delivery attempts so far; the worker drops the task past the limit.
    #[serde(default)]
    pub attempts: u32,
    pub enqueued_at: DateTime<Utc>,
}

impl SyncTask {
    pub fn new(tool_id: Uuid, op: SyncOp) -> Self {
        Self {
            id: Uuid::new_v4(),
            tool_id,
            op,
            attempts: 0,
            enqueued_at: Utc::now(),
        }
    }
}

/// Outcome of a reconciliation or resync run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncReport {
    /// Catalog entries examined.
    pub scanned: usize,
    /// Entries that already had a row and were left alone.
    pub already_synced: usize,
    /// Rows written this run.
    pub synced: usize,
    /// Entries whose embedding failed; ids included for diagnostics.
    pub failed: Vec<Uuid>,
}

/// Drift statistics between catalog and embedding store.
#[derive(Debug, Clone, Serialize)]
pub struct SyncStats {
    pub catalog_count: usize,
    pub embedded_count: usize,
    /// Catalog tools with no embedding row.
    pub missing: Vec<Uuid>,
    /// Rows whose stored content hash no longer matches the catalog text.
    pub stale: usize,
    /// Share of catalog tools with a matching row, 0-100.
    pub coverage_percent: f64,
}
