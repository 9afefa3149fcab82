//! Auth routes.
//!
//! `verify_password` sits outside the gate middleware so the client can
//! clear gate A first; everything else here runs behind both gates.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use zeno_types::Identity;

use crate::auth_layer::bearer_token;
use crate::routes::fail;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct PasswordRequest {
    pub password: String,
}

#[derive(Serialize)]
pub struct PasswordResponse {
    pub ok: bool,
}

pub async fn verify_password(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PasswordRequest>,
) -> Result<Json<PasswordResponse>, (StatusCode, String)> {
    state.gate.check_password(&request.password).map_err(fail)?;
    Ok(Json(PasswordResponse { ok: true }))
}

pub async fn session(Extension(identity): Extension<Identity>) -> Json<Identity> {
    Json(identity)
}

pub async fn logout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<StatusCode, (StatusCode, String)> {
    state
        .gate
        .sign_out(bearer_token(&headers))
        .await
        .map_err(fail)?;
    Ok(StatusCode::NO_CONTENT)
}
