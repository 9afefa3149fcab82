//! Comment routes.

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;
use zeno_types::{Comment, NewComment};

use crate::routes::fail;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CommentsQuery {
    #[serde(rename = "toolId")]
    pub tool_id: Option<Uuid>,
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CommentsQuery>,
) -> Result<Json<Vec<Comment>>, (StatusCode, String)> {
    let comments = state.comments.list(query.tool_id).await.map_err(fail)?;
    Ok(Json(comments))
}

/// First hop of x-forwarded-for, or "unknown" when the proxy strips it.
fn client_ip(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

pub async fn add(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(submission): Json<NewComment>,
) -> Result<(StatusCode, Json<Comment>), (StatusCode, String)> {
    let comment = state
        .comments
        .add(submission, client_ip(&headers))
        .await
        .map_err(fail)?;
    Ok((StatusCode::CREATED, Json(comment)))
}
