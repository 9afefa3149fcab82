//! User management routes. Admin only.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use std::sync::Arc;
use zeno_types::{Identity, Role, UserRecord};

use crate::auth_layer::require_admin;
use crate::routes::fail;
use crate::state::AppState;

pub async fn list(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<Vec<UserRecord>>, (StatusCode, String)> {
    require_admin(&identity)?;
    let users = state.directory.list_users().await.map_err(fail)?;
    Ok(Json(users))
}

#[derive(Deserialize)]
pub struct UpdateUserRequest {
    pub role: Role,
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Extension(identity): Extension<Identity>,
    Json(request): Json<UpdateUserRequest>,
) -> Result<Json<UserRecord>, (StatusCode, String)> {
    require_admin(&identity)?;
    let user = state
        .directory
        .set_user_role(&id, request.role)
        .await
        .map_err(fail)?;
    tracing::info!(target: "zeno::auth", "{} set role of {} to {:?}", identity.user.email, id, request.role);
    Ok(Json(user))
}

pub async fn delete(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Extension(identity): Extension<Identity>,
) -> Result<StatusCode, (StatusCode, String)> {
    require_admin(&identity)?;
    state.directory.delete_user(&id).await.map_err(fail)?;
    tracing::info!(target: "zeno::auth", "{} deleted user {}", identity.user.email, id);
    Ok(StatusCode::NO_CONTENT)
}
