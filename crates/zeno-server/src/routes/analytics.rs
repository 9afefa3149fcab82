//! Analytics routes.

use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use std::sync::Arc;
use zeno_types::{AnalyticsEvent, AnalyticsEventType, AnalyticsSummary};

use crate::routes::fail;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct RecordEventRequest {
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(rename = "toolId")]
    pub tool_id: Option<String>,
    #[serde(default)]
    pub data: serde_json::Value,
}

pub async fn record(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RecordEventRequest>,
) -> Result<(StatusCode, Json<AnalyticsEvent>), (StatusCode, String)> {
    let event_type: AnalyticsEventType = request
        .event_type
        .parse()
        .map_err(|e: zeno_types::UnknownEventType| (StatusCode::BAD_REQUEST, e.to_string()))?;

    // A top-level toolId folds into the event payload so the per-tool
    // counters see it either way.
    let mut data = match request.data {
        serde_json::Value::Object(map) => map,
        serde_json::Value::Null => serde_json::Map::new(),
        other => {
            let mut map = serde_json::Map::new();
            map.insert("value".to_string(), other);
            map
        }
    };
    if let Some(tool_id) = request.tool_id {
        data.insert("toolId".to_string(), serde_json::Value::String(tool_id));
    }

    let event = AnalyticsEvent::new(event_type, serde_json::Value::Object(data));
    state.analytics.record(&event).await.map_err(fail)?;
    Ok((StatusCode::CREATED, Json(event)))
}

pub async fn summary(
    State(state): State<Arc<AppState>>,
) -> Result<Json<AnalyticsSummary>, (StatusCode, String)> {
    let summary = state.analytics.summary().await.map_err(fail)?;
    Ok(Json(summary))
}
