//! Key-value store abstraction.
//!
//! The [`KvStore`] trait covers the Redis-shaped subset the hub actually
//! uses: string documents for config, counters and sorted sets for
//! analytics, lists for comments and the sync outbox. Three backends:
//!
//! - [`MemoryKv`]: DashMap-backed, for tests.
//! - [`RestKv`]: a Redis-compatible REST endpoint (Upstash style) where
//!   each command is a JSON array POSTed to the base URL with bearer auth.
//! - [`UnconfiguredKv`]: returns `MissingCredential` from every call, so a
//!   deployment without store credentials serves 5xx instead of crashing.

use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::VecDeque;
use std::time::Duration;

use crate::{Result, ZenoError};

/// Redis-shaped storage operations.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> Result<()>;
    /// Returns whether a key was removed.
    async fn del(&self, key: &str) -> Result<bool>;
    /// Atomic increment; creates the key at `delta` when absent.
    async fn incr_by(&self, key: &str, delta: i64) -> Result<i64>;
    /// Add or rescore a member in a sorted set.
    async fn zadd(&self, key: &str, score: f64, member: &str) -> Result<()>;
    /// Members by descending score; `stop = -1` means the end of the set.
    async fn zrevrange(&self, key: &str, start: isize, stop: isize) -> Result<Vec<String>>;
    /// Append to the tail of a list.
    async fn rpush(&self, key: &str, value: &str) -> Result<()>;
    /// List slice; `stop = -1` means the end of the list.
    async fn lrange(&self, key: &str, start: isize, stop: isize) -> Result<Vec<String>>;
    /// Pop from the head of a list.
    async fn lpop(&self, key: &str) -> Result<Option<String>>;
}

/// Resolve redis-style negative indices against a length, inclusive range.
fn resolve_range(len: usize, start: isize, stop: isize) -> Option<(usize, usize)> {
    let len = len as isize;
    let mut start = if start < 0 { len + start } else { start };
    let mut stop = if stop < 0 { len + stop } else { stop };
    if start < 0 {
        start = 0;
    }
    if stop >= len {
        stop = len - 1;
    }
    if len == 0 || start > stop || start >= len {
        return None;
    }
    Some((start as usize, stop as usize))
}

// ============ In-memory backend ============

/// In-memory store used by tests and local development.
#[derive(Default)]
pub struct MemoryKv {
    strings: DashMap<String, String>,
    counters: DashMap<String, i64>,
    zsets: DashMap<String, Vec<(f64, String)>>,
    lists: DashMap<String, VecDeque<String>>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KvStore for MemoryKv {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        if let Some(v) = self.strings.get(key) {
            return Ok(Some(v.clone()));
        }
        Ok(self.counters.get(key).map(|v| v.to_string()))
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.counters.remove(key);
        self.strings.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<bool> {
        let removed = self.strings.remove(key).is_some()
            | self.counters.remove(key).is_some()
            | self.zsets.remove(key).is_some()
            | self.lists.remove(key).is_some();
        Ok(removed)
    }

    async fn incr_by(&self, key: &str, delta: i64) -> Result<i64> {
        // The entry guard holds the shard lock, so concurrent increments
        // of one key cannot interleave.
        let mut entry = self.counters.entry(key.to_string()).or_insert(0);
        *entry += delta;
        Ok(*entry)
    }

    async fn zadd(&self, key: &str, score: f64, member: &str) -> Result<()> {
        let mut set = self.zsets.entry(key.to_string()).or_default();
        if let Some(existing) = set.iter_mut().find(|(_, m)| m == member) {
            existing.0 = score;
        } else {
            set.push((score, member.to_string()));
        }
        Ok(())
    }

    async fn zrevrange(&self, key: &str, start: isize, stop: isize) -> Result<Vec<String>> {
        let Some(set) = self.zsets.get(key) else {
            return Ok(Vec::new());
        };
        let mut members = set.clone();
        members.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        let Some((start, stop)) = resolve_range(members.len(), start, stop) else {
            return Ok(Vec::new());
        };
        Ok(members[start..=stop].iter().map(|(_, m)| m.clone()).collect())
    }

    async fn rpush(&self, key: &str, value: &str) -> Result<()> {
        self.lists
            .entry(key.to_string())
            .or_default()
            .push_back(value.to_string());
        Ok(())
    }

    async fn lrange(&self, key: &str, start: isize, stop: isize) -> Result<Vec<String>> {
        let Some(list) = self.lists.get(key) else {
            return Ok(Vec::new());
        };
        let Some((start, stop)) = resolve_range(list.len(), start, stop) else {
            return Ok(Vec::new());
        };
        Ok(list.iter().skip(start).take(stop - start + 1).cloned().collect())
    }

    async fn lpop(&self, key: &str) -> Result<Option<String>> {
        Ok(self
            .lists
            .get_mut(key)
            .and_then(|mut list| list.pop_front()))
    }
}

// ============ REST backend ============

/// Client for a Redis-compatible REST endpoint.
///
/// Commands are JSON arrays (`["SET", key, value]`) POSTed to the base URL;
/// responses are `{"result": ...}` or `{"error": "..."}`. One attempt per
/// command, no retries.
pub struct RestKv {
    client: reqwest::Client,
    url: String,
    token: String,
}

impl RestKv {
    pub fn new(url: impl Into<String>, token: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
            token: token.into(),
        })
    }

    async fn command(&self, cmd: &[String]) -> Result<serde_json::Value> {
        let resp = self
            .client
            .post(&self.url)
            .bearer_auth(&self.token)
            .json(&cmd)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ZenoError::Upstream {
                service: "kv",
                message: format!("{status}: {body}"),
            });
        }

        let body: serde_json::Value = resp.json().await?;
        if let Some(err) = body.get("error").and_then(|e| e.as_str()) {
            return Err(ZenoError::Upstream {
                service: "kv",
                message: err.to_string(),
            });
        }
        Ok(body.get("result").cloned().unwrap_or(serde_json::Value::Null))
    }

    fn args<const N: usize>(parts: [&str; N]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }
}

#[async_trait]
impl KvStore for RestKv {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let result = self.command(&Self::args(["GET", key])).await?;
        match result {
            serde_json::Value::Null => Ok(None),
            serde_json::Value::String(s) => Ok(Some(s)),
            other => Ok(Some(other.to_string())),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.command(&Self::args(["SET", key, value])).await?;
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<bool> {
        let result = self.command(&Self::args(["DEL", key])).await?;
        Ok(result.as_i64().unwrap_or(0) > 0)
    }

    async fn incr_by(&self, key: &str, delta: i64) -> Result<i64> {
        let result = self
            .command(&Self::args(["INCRBY", key, &delta.to_string()]))
            .await?;
        result.as_i64().ok_or_else(|| ZenoError::Upstream {
            service: "kv",
            message: format!("INCRBY returned non-integer: {result}"),
        })
    }

    async fn zadd(&self, key: &str, score: f64, member: &str) -> Result<()> {
        self.command(&Self::args(["ZADD", key, &score.to_string(), member]))
            .await?;
        Ok(())
    }

    async fn zrevrange(&self, key: &str, start: isize, stop: isize) -> Result<Vec<String>> {
        let result = self
            .command(&Self::args([
                "ZREVRANGE",
                key,
                &start.to_string(),
                &stop.to_string(),
            ]))
            .await?;
        Ok(string_array(result))
    }

    async fn rpush(&self, key: &str, value: &str) -> Result<()> {
        self.command(&Self::args(["RPUSH", key, value])).await?;
        Ok(())
    }

    async fn lrange(&self, key: &str, start: isize, stop: isize) -> Result<Vec<String>> {
        let result = self
            .command(&Self::args([
                "LRANGE",
                key,
                &start.to_string(),
                &stop.to_string(),
            ]))
            .await?;
        Ok(string_array(result))
    }

    async fn lpop(&self, key: &str) -> Result<Option<String>> {
        let result = self.command(&Self::args(["LPOP", key])).await?;
        match result {
            serde_json::Value::Null => Ok(None),
            serde_json::Value::String(s) => Ok(Some(s)),
            other => Ok(Some(other.to_string())),
        }
    }
}

fn string_array(value: serde_json::Value) -> Vec<String> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

// ============ Unconfigured backend ============

/// Placeholder used when the store credentials are absent.
pub struct UnconfiguredKv;

macro_rules! unconfigured {
    () => {
        Err(ZenoError::MissingCredential("key-value store"))
    };
}

#[async_trait]
impl KvStore for UnconfiguredKv {
    async fn get(&self, _key: &str) -> Result<Option<String>> {
        unconfigured!()
    }
    async fn set(&self, _key: &str, _value: &str) -> Result<()> {
        unconfigured!()
    }
    async fn del(&self, _key: &str) -> Result<bool> {
        unconfigured!()
    }
    async fn incr_by(&self, _key: &str, _delta: i64) -> Result<i64> {
        unconfigured!()
    }
    async fn zadd(&self, _key: &str, _score: f64, _member: &str) -> Result<()> {
        unconfigured!()
    }
    async fn zrevrange(&self, _key: &str, _start: isize, _stop: isize) -> Result<Vec<String>> {
        unconfigured!()
    }
    async fn rpush(&self, _key: &str, _value: &str) -> Result<()> {
        unconfigured!()
    }
    async fn lrange(&self, _key: &str, _start: isize, _stop: isize) -> Result<Vec<String>> {
        unconfigured!()
    }
    async fn lpop(&self, _key: &str) -> Result<Option<String>> {
        unconfigured!()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn get_set_del_round_trip() {
        let kv = MemoryKv::new();
        assert_eq!(kv.get("k").await.unwrap(), None);
        kv.set("k", "v").await.unwrap();
        assert_eq!(kv.get("k").await.unwrap(), Some("v".to_string()));
        assert!(kv.del("k").await.unwrap());
        assert!(!kv.del("k").await.unwrap());
        assert_eq!(kv.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn incr_creates_and_accumulates() {
        let kv = MemoryKv::new();
        assert_eq!(kv.incr_by("n", 1).await.unwrap(), 1);
        assert_eq!(kv.incr_by("n", 4).await.unwrap(), 5);
        // Counters are visible through plain GET, as in redis.
        assert_eq!(kv.get("n").await.unwrap(), Some("5".to_string()));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_increments_do_not_lose_updates() {
        let kv = Arc::new(MemoryKv::new());
        let mut handles = Vec::new();
        for _ in 0..16 {
            let kv = kv.clone();
            handles.push(tokio::spawn(async move {
                kv.incr_by("hits", 1).await.unwrap();
            }));
        }
        for h in handles {
            h.await.unwrap();
        }
        assert_eq!(kv.get("hits").await.unwrap(), Some("16".to_string()));
    }

    #[tokio::test]
    async fn zrevrange_orders_by_score_descending() {
        let kv = MemoryKv::new();
        kv.zadd("z", 1.0, "a").await.unwrap();
        kv.zadd("z", 3.0, "c").await.unwrap();
        kv.zadd("z", 2.0, "b").await.unwrap();

        let all = kv.zrevrange("z", 0, -1).await.unwrap();
        assert_eq!(all, vec!["c", "b", "a"]);

        let top_two = kv.zrevrange("z", 0, 1).await.unwrap();
        assert_eq!(top_two, vec!["c", "b"]);
    }

    #[tokio::test]
    async fn zadd_rescores_existing_member() {
        let kv = MemoryKv::new();
        kv.zadd("z", 1.0, "a").await.unwrap();
        kv.zadd("z", 9.0, "a").await.unwrap();
        assert_eq!(kv.zrevrange("z", 0, -1).await.unwrap(), vec!["a"]);
    }

    #[tokio::test]
    async fn list_push_range_pop() {
        let kv = MemoryKv::new();
        kv.rpush("l", "one").await.unwrap();
        kv.rpush("l", "two").await.unwrap();
        kv.rpush("l", "three").await.unwrap();

        assert_eq!(
            kv.lrange("l", 0, -1).await.unwrap(),
            vec!["one", "two", "three"]
        );
        assert_eq!(kv.lrange("l", 1, 1).await.unwrap(), vec!["two"]);
        assert_eq!(kv.lpop("l").await.unwrap(), Some("one".to_string()));
        assert_eq!(kv.lpop("l").await.unwrap(), Some("two".to_string()));
        assert_eq!(kv.lpop("l").await.unwrap(), Some("three".to_string()));
        assert_eq!(kv.lpop("l").await.unwrap(), None);
    }

    #[tokio::test]
    async fn unconfigured_store_reports_missing_credential() {
        let kv = UnconfiguredKv;
        let err = kv.get("k").await.unwrap_err();
        assert!(matches!(err, ZenoError::MissingCredential(_)));
    }

    #[test]
    fn rest_results_decode_string_arrays() {
        let value = serde_json::json!(["a", "b"]);
        assert_eq!(string_array(value), vec!["a", "b"]);
        assert!(string_array(serde_json::Value::Null).is_empty());
        assert!(string_array(serde_json::json!(7)).is_empty());
    }

    #[test]
    fn range_resolution_handles_negative_and_out_of_bounds() {
        assert_eq!(resolve_range(3, 0, -1), Some((0, 2)));
        assert_eq!(resolve_range(3, 1, 5), Some((1, 2)));
        assert_eq!(resolve_range(3, -2, -1), Some((1, 2)));
        assert_eq!(resolve_range(0, 0, -1), None);
        assert_eq!(resolve_range(3, 5, 6), None);
        assert_eq!(resolve_range(3, 2, 1), None);
    }
}
