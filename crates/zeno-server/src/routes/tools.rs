//! Tool catalog routes.
//!
//! Mutations enqueue an embedding sync task before responding; the
//! background worker applies it, so the response never waits on the
//! embedding provider.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;
use zeno_types::{NewTool, SyncOp, Tool, ToolUpdate};

use crate::routes::fail;
use crate::state::AppState;

async fn enqueue_sync(state: &AppState, tool_id: Uuid, op: SyncOp) {
    // The mutation already committed; a full outbox failure only widens
    // the drift window that sync-missing closes later.
    if let Err(e) = state.outbox.enqueue(tool_id, op).await {
        tracing::warn!(target: "zeno::sync", "Failed to enqueue {:?} for tool {}: {}", op, tool_id, e);
    }
}

pub async fn list(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Tool>>, (StatusCode, String)> {
    let tools = state.catalog.list().await.map_err(fail)?;
    Ok(Json(tools))
}

pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Tool>, (StatusCode, String)> {
    let tool = state.catalog.get(id).await.map_err(fail)?;
    Ok(Json(tool))
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(input): Json<NewTool>,
) -> Result<(StatusCode, Json<Tool>), (StatusCode, String)> {
    let tool = state.catalog.create(input).await.map_err(fail)?;
    enqueue_sync(&state, tool.id, SyncOp::Upsert).await;
    Ok((StatusCode::CREATED, Json(tool)))
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(patch): Json<ToolUpdate>,
) -> Result<Json<Tool>, (StatusCode, String)> {
    let tool = state.catalog.update(id, patch).await.map_err(fail)?;
    enqueue_sync(&state, tool.id, SyncOp::Upsert).await;
    Ok(Json(tool))
}

pub async fn delete(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    state.catalog.delete(id).await.map_err(fail)?;
    enqueue_sync(&state, id, SyncOp::Delete).await;
    Ok(StatusCode::NO_CONTENT)
}
