//! Embedding store backends.
//!
//! One row per tool, keyed by `tool_id`, holding scalar metadata and a
//! 1536-float vector. [`SupabaseVectors`] talks PostgREST and delegates
//! similarity to the `match_tools` RPC (hybrid vector + keyword matching
//! happens server-side); [`MemoryVectors`] ranks by cosine similarity and
//! backs the test suites.

use async_trait::async_trait;
use dashmap::DashMap;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use uuid::Uuid;

use zeno_types::{ToolEmbedding, ToolMatch};

use crate::{Result, ZenoError};

#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Insert or replace the row for a tool.
    async fn upsert(&self, row: ToolEmbedding) -> Result<()>;
    /// Remove a row; returns whether one existed.
    async fn delete(&self, tool_id: Uuid) -> Result<bool>;
    async fn exists(&self, tool_id: Uuid) -> Result<bool>;
    async fn count(&self) -> Result<u64>;
    /// Stored rows as `tool_id -> content_hash`, for drift checks.
    async fn index(&self) -> Result<HashMap<Uuid, String>>;
    /// Nearest rows for a query, best first.
    async fn search(
        &self,
        query_vec: &[f32],
        query_text: &str,
        limit: usize,
    ) -> Result<Vec<ToolMatch>>;
}

/// Cosine similarity between two vectors; 0.0 for mismatched or empty input.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < f32::EPSILON {
        return 0.0;
    }
    dot / denom
}

// ============ In-memory backend ============

/// DashMap-backed store for tests; ranks by cosine similarity only.
#[derive(Default)]
pub struct MemoryVectors {
    rows: DashMap<Uuid, ToolEmbedding>,
}

impl MemoryVectors {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VectorStore for MemoryVectors {
    async fn upsert(&self, row: ToolEmbedding) -> Result<()> {
        self.rows.insert(row.tool_id, row);
        Ok(())
    }

    async fn delete(&self, tool_id: Uuid) -> Result<bool> {
        Ok(self.rows.remove(&tool_id).is_some())
    }

    async fn exists(&self, tool_id: Uuid) -> Result<bool> {
        Ok(self.rows.contains_key(&tool_id))
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.rows.len() as u64)
    }

    async fn index(&self) -> Result<HashMap<Uuid, String>> {
        Ok(self
            .rows
            .iter()
            .map(|r| (*r.key(), r.content_hash.clone()))
            .collect())
    }

    async fn search(
        &self,
        query_vec: &[f32],
        _query_text: &str,
        limit: usize,
    ) -> Result<Vec<ToolMatch>> {
        let mut scored: Vec<ToolMatch> = self
            .rows
            .iter()
            .map(|r| ToolMatch::from_row(r.value(), cosine_similarity(query_vec, &r.embedding)))
            .collect();
        scored.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(limit);
        Ok(scored)
    }
}

// ============ PostgREST backend ============

/// PostgREST client for the `tool_embeddings` table.
pub struct SupabaseVectors {
    client: reqwest::Client,
    base_url: String,
    service_key: String,
}

const TABLE: &str = "tool_embeddings";
const MATCH_RPC: &str = "match_tools";

impl SupabaseVectors {
    pub fn new(base_url: impl Into<String>, service_key: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            service_key: service_key.into(),
        })
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, TABLE)
    }

    fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
    }
}

async fn check(resp: reqwest::Response, service: &'static str) -> Result<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let message = resp.text().await.unwrap_or_default();
    if status == reqwest::StatusCode::CONFLICT {
        return Err(ZenoError::Conflict(message));
    }
    Err(ZenoError::Upstream {
        service,
        message: format!("{status}: {message}"),
    })
}

#[derive(Deserialize)]
struct IndexRow {
    tool_id: Uuid,
    #[serde(default)]
    content_hash: String,
}

#[derive(Deserialize)]
struct MatchRow {
    tool_id: Uuid,
    title: String,
    #[serde(default)]
    description: String,
    #[serde(rename = "type", default)]
    tool_type: String,
    #[serde(default)]
    categories: Vec<String>,
    #[serde(default)]
    skill_level: String,
    #[serde(default)]
    url: String,
    similarity: f32,
}

#[async_trait]
impl VectorStore for SupabaseVectors {
    async fn upsert(&self, row: ToolEmbedding) -> Result<()> {
        let resp = self
            .request(self.client.post(self.table_url()))
            .query(&[("on_conflict", "tool_id")])
            .header("Prefer", "resolution=merge-duplicates")
            .json(&[row])
            .send()
            .await?;
        check(resp, "supabase").await?;
        Ok(())
    }

    async fn delete(&self, tool_id: Uuid) -> Result<bool> {
        let resp = self
            .request(self.client.delete(self.table_url()))
            .query(&[("tool_id", format!("eq.{tool_id}"))])
            .header("Prefer", "return=representation")
            .send()
            .await?;
        let removed: Vec<serde_json::Value> = check(resp, "supabase").await?.json().await?;
        Ok(!removed.is_empty())
    }

    async fn exists(&self, tool_id: Uuid) -> Result<bool> {
        let resp = self
            .request(self.client.get(self.table_url()))
            .query(&[
                ("tool_id", format!("eq.{tool_id}")),
                ("select", "tool_id".to_string()),
            ])
            .send()
            .await?;
        let rows: Vec<serde_json::Value> = check(resp, "supabase").await?.json().await?;
        Ok(!rows.is_empty())
    }

    async fn count(&self) -> Result<u64> {
        let resp = self
            .request(self.client.get(self.table_url()))
            .query(&[("select", "tool_id")])
            .header("Prefer", "count=exact")
            .header("Range", "0-0")
            .send()
            .await?;
        let resp = check(resp, "supabase").await?;

        // content-range looks like "0-0/57"; the total follows the slash.
        let total = resp
            .headers()
            .get("content-range")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.rsplit('/').next())
            .and_then(|v| v.parse::<u64>().ok());
        match total {
            Some(n) => Ok(n),
            None => {
                let rows: Vec<serde_json::Value> = resp.json().await?;
                Ok(rows.len() as u64)
            }
        }
    }

    async fn index(&self) -> Result<HashMap<Uuid, String>> {
        let resp = self
            .request(self.client.get(self.table_url()))
            .query(&[("select", "tool_id,content_hash")])
            .send()
            .await?;
        let rows: Vec<IndexRow> = check(resp, "supabase").await?.json().await?;
        Ok(rows
            .into_iter()
            .map(|r| (r.tool_id, r.content_hash))
            .collect())
    }

    async fn search(
        &self,
        query_vec: &[f32],
        query_text: &str,
        limit: usize,
    ) -> Result<Vec<ToolMatch>> {
        let resp = self
            .request(
                self.client
                    .post(format!("{}/rest/v1/rpc/{}", self.base_url, MATCH_RPC)),
            )
            .json(&serde_json::json!({
                "query_embedding": query_vec,
                "query_text": query_text,
                "match_count": limit,
            }))
            .send()
            .await?;
        let rows: Vec<MatchRow> = check(resp, "supabase").await?.json().await?;
        Ok(rows
            .into_iter()
            .map(|r| ToolMatch {
                id: r.tool_id,
                title: r.title,
                description: r.description,
                tool_type: r.tool_type,
                url: r.url,
                categories: r.categories,
                skill_level: r.skill_level,
                similarity: r.similarity,
            })
            .collect())
    }
}

// ============ Unconfigured backend ============

pub struct UnconfiguredVectors;

macro_rules! unconfigured {
    () => {
        Err(ZenoError::MissingCredential("embedding store"))
    };
}

#[async_trait]
impl VectorStore for UnconfiguredVectors {
    async fn upsert(&self, _row: ToolEmbedding) -> Result<()> {
        unconfigured!()
    }
    async fn delete(&self, _tool_id: Uuid) -> Result<bool> {
        unconfigured!()
    }
    async fn exists(&self, _tool_id: Uuid) -> Result<bool> {
        unconfigured!()
    }
    async fn count(&self) -> Result<u64> {
        unconfigured!()
    }
    async fn index(&self) -> Result<HashMap<Uuid, String>> {
        unconfigured!()
    }
    async fn search(
        &self,
        _query_vec: &[f32],
        _query_text: &str,
        _limit: usize,
    ) -> Result<Vec<ToolMatch>> {
        unconfigured!()
    }
}
