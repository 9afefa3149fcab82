//! Embedding sync routes: drift stats and reconciliation.

use axum::{extract::State, http::StatusCode, Extension, Json};
use serde::Deserialize;
use std::sync::Arc;
use zeno_types::{Identity, SyncReport, SyncStats};

use crate::auth_layer::require_admin;
use crate::routes::fail;
use crate::state::AppState;

pub async fn stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SyncStats>, (StatusCode, String)> {
    let stats = state.sync.stats().await.map_err(fail)?;
    Ok(Json(stats))
}

#[derive(Deserialize)]
pub struct SyncActionRequest {
    pub action: String,
}

pub async fn run(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Json(request): Json<SyncActionRequest>,
) -> Result<Json<SyncReport>, (StatusCode, String)> {
    let report = match request.action.as_str() {
        "sync-missing" => state.sync.sync_missing().await.map_err(fail)?,
        "force-resync" => {
            require_admin(&identity)?;
            state.sync.force_resync().await.map_err(fail)?
        }
        other => {
            return Err((
                StatusCode::BAD_REQUEST,
                format!("unknown sync action: {other}"),
            ))
        }
    };
    Ok(Json(report))
}
