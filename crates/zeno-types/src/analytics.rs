//! Usage analytics events and summaries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Tracked event kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalyticsEventType {
    ChatQuery,
    ChatResponse,
    ToolView,
    ToolFavorite,
}

impl AnalyticsEventType {
    pub const ALL: [AnalyticsEventType; 4] = [
        AnalyticsEventType::ChatQuery,
        AnalyticsEventType::ChatResponse,
        AnalyticsEventType::ToolView,
        AnalyticsEventType::ToolFavorite,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AnalyticsEventType::ChatQuery => "chat_query",
            AnalyticsEventType::ChatResponse => "chat_response",
            AnalyticsEventType::ToolView => "tool_view",
            AnalyticsEventType::ToolFavorite => "tool_favorite",
        }
    }
}

#[derive(Debug, Error)]
#[error("unknown analytics event type: {0}")]
pub struct UnknownEventType(pub String);

impl std::str::FromStr for AnalyticsEventType {
    type Err = UnknownEventType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "chat_query" => Ok(AnalyticsEventType::ChatQuery),
            "chat_response" => Ok(AnalyticsEventType::ChatResponse),
            "tool_view" => Ok(AnalyticsEventType::ToolView),
            "tool_favorite" => Ok(AnalyticsEventType::ToolFavorite),
            other => Err(UnknownEventType(other.to_string())),
        }
    }
}

/// Append-only usage event; never mutated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsEvent {
    #[serde(rename = "type")]
    pub event_type: AnalyticsEventType,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub data: serde_json::Value,
}

impl AnalyticsEvent {
    pub fn new(event_type: AnalyticsEventType, data: serde_json::Value) -> Self {
        Self {
            event_type,
            timestamp: Utc::now(),
            data,
        }
    }

    /// Tool id carried in the event payload, when present.
    pub fn tool_id(&self) -> Option<&str> {
        self.data.get("toolId").and_then(|v| v.as_str())
    }
}

/// Denormalized counter snapshot for dashboarding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsSummary {
    pub total: i64,
    /// Per-type totals keyed by wire name.
    pub by_type: HashMap<String, i64>,
    /// Today's totals keyed by wire name.
    pub today: HashMap<String, i64>,
    pub recent: Vec<AnalyticsEvent>,
}
