//! Usage analytics over the key-value store.
//!
//! Each tracked action writes one event record into the time-ordered sets
//! plus three counter families: per-type totals, per-day totals, and
//! per-tool totals. The writes are not atomic across families; a crash
//! mid-sequence leaves counters ahead of or behind the event log, which is
//! accepted for telemetry.

use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;

use zeno_types::{AnalyticsEvent, AnalyticsEventType, AnalyticsSummary};

use crate::kv::KvStore;
use crate::Result;

const EVENTS_KEY: &str = "analytics:events";
const TOTAL_KEY: &str = "analytics:count:total";
const RECENT_LIMIT: isize = 19;

fn events_key(event_type: AnalyticsEventType) -> String {
    format!("analytics:events:{}", event_type.as_str())
}

fn count_key(event_type: AnalyticsEventType) -> String {
    format!("analytics:count:{}", event_type.as_str())
}

fn daily_key(event_type: AnalyticsEventType, day: &str) -> String {
    format!("analytics:daily:{}:{}", event_type.as_str(), day)
}

fn tool_key(event_type: AnalyticsEventType, tool_id: &str) -> Option<String> {
    match event_type {
        AnalyticsEventType::ToolView => Some(format!("analytics:tool:views:{tool_id}")),
        AnalyticsEventType::ToolFavorite => Some(format!("analytics:tool:favorites:{tool_id}")),
        _ => None,
    }
}

#[derive(Clone)]
pub struct Analytics {
    kv: Arc<dyn KvStore>,
}

impl Analytics {
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self { kv }
    }

    /// Record one event and bump its counter families.
    pub async fn record(&self, event: &AnalyticsEvent) -> Result<()> {
        let json = serde_json::to_string(event)?;
        let score = event.timestamp.timestamp_millis() as f64;
        let day = event.timestamp.format("%Y-%m-%d").to_string();

        self.kv.zadd(EVENTS_KEY, score, &json).await?;
        self.kv
            .zadd(&events_key(event.event_type), score, &json)
            .await?;

        self.kv.incr_by(&count_key(event.event_type), 1).await?;
        self.kv.incr_by(TOTAL_KEY, 1).await?;
        self.kv
            .incr_by(&daily_key(event.event_type, &day), 1)
            .await?;

        if let Some(tool_id) = event.tool_id() {
            if let Some(key) = tool_key(event.event_type, tool_id) {
                self.kv.incr_by(&key, 1).await?;
            }
        }
        Ok(())
    }

    async fn counter(&self, key: &str) -> Result<i64> {
        Ok(self
            .kv
            .get(key)
            .await?
            .and_then(|v| v.parse().ok())
            .unwrap_or(0))
    }

    /// Counter snapshot; the per-type families are fetched concurrently.
    pub async fn summary(&self) -> Result<AnalyticsSummary> {
        let today = Utc::now().format("%Y-%m-%d").to_string();

        let totals = futures::future::try_join_all(
            AnalyticsEventType::ALL
                .iter()
                .map(|t| self.counter_pair(*t, &today)),
        )
        .await?;

        let mut by_type = HashMap::new();
        let mut today_counts = HashMap::new();
        for (event_type, total, daily) in totals {
            by_type.insert(event_type.as_str().to_string(), total);
            today_counts.insert(event_type.as_str().to_string(), daily);
        }

        let total = self.counter(TOTAL_KEY).await?;
        let recent = self
            .kv
            .zrevrange(EVENTS_KEY, 0, RECENT_LIMIT)
            .await?
            .iter()
            .filter_map(|raw| serde_json::from_str(raw).ok())
            .collect();

        Ok(AnalyticsSummary {
            total,
            by_type,
            today: today_counts,
            recent,
        })
    }

    async fn counter_pair(
        &self,
        event_type: AnalyticsEventType,
        day: &str,
    ) -> Result<(AnalyticsEventType, i64, i64)> {
        let count_k = count_key(event_type);
        let daily_k = daily_key(event_type, day);
        let (total, daily) = tokio::try_join!(
            self.counter(&count_k),
            self.counter(&daily_k),
        )?;
        Ok((event_type, total, daily))
    }

    /// View counter for one tool.
    pub async fn tool_views(&self, tool_id: &str) -> Result<i64> {
        self.counter(&format!("analytics:tool:views:{tool_id}")).await
    }
}
