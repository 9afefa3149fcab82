//! Auth-gate middleware.
//!
//! Protected routes require both gates: the shared portal password in
//! `x-portal-password` and a bearer session in `Authorization`. The
//! resolved [`Identity`] is stored in request extensions for handlers
//! that need the caller's role.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use zeno_types::Identity;

use crate::routes::fail;
use crate::state::AppState;

pub const PORTAL_PASSWORD_HEADER: &str = "x-portal-password";

/// Bearer token from the Authorization header, if any.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

pub async fn require_gates(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let password = request
        .headers()
        .get(PORTAL_PASSWORD_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let bearer = bearer_token(request.headers()).map(str::to_string);

    match state
        .gate
        .authorize(password.as_deref(), bearer.as_deref())
        .await
    {
        Ok(identity) => {
            request.extensions_mut().insert(identity);
            next.run(request).await
        }
        Err(e) => {
            tracing::debug!(target: "zeno::auth", "Gate rejected request: {}", e);
            fail(e).into_response()
        }
    }
}

/// Admin-only surfaces call this after the gate has run.
pub fn require_admin(identity: &Identity) -> Result<(), (StatusCode, String)> {
    if identity.is_admin() {
        Ok(())
    } else {
        Err((StatusCode::FORBIDDEN, "admin role required".to_string()))
    }
}
