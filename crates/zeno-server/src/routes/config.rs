//! Config document routes.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use std::sync::Arc;
use zeno_types::{ConfigDocKind, Identity};

use crate::auth_layer::require_admin;
use crate::routes::fail;
use crate::state::AppState;

fn parse_kind(kind: &str) -> Result<ConfigDocKind, (StatusCode, String)> {
    kind.parse()
        .map_err(|e: zeno_types::UnknownConfigDoc| (StatusCode::BAD_REQUEST, e.to_string()))
}

pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(kind): Path<String>,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    let kind = parse_kind(&kind)?;
    let doc = state
        .config_store
        .get(kind)
        .await
        .map_err(fail)?
        .ok_or((StatusCode::NOT_FOUND, format!("{} is not set", kind.as_key())))?;
    Ok(Json(doc))
}

pub async fn set(
    State(state): State<Arc<AppState>>,
    Path(kind): Path<String>,
    Extension(identity): Extension<Identity>,
    Json(body): Json<serde_json::Value>,
) -> Result<StatusCode, (StatusCode, String)> {
    require_admin(&identity)?;
    let kind = parse_kind(&kind)?;
    state.config_store.set(kind, &body).await.map_err(fail)?;
    tracing::info!(target: "zeno::api", "{} updated {}", identity.user.email, kind.as_key());
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete(
    State(state): State<Arc<AppState>>,
    Path(kind): Path<String>,
    Extension(identity): Extension<Identity>,
) -> Result<StatusCode, (StatusCode, String)> {
    require_admin(&identity)?;
    let kind = parse_kind(&kind)?;
    let removed = state.config_store.delete(kind).await.map_err(fail)?;
    if !removed {
        return Err((StatusCode::NOT_FOUND, format!("{} is not set", kind.as_key())));
    }
    Ok(StatusCode::NO_CONTENT)
}
