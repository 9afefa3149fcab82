//! HTTP route handlers.

pub mod analytics;
pub mod auth;
pub mod chat;
pub mod comments;
pub mod config;
pub mod embeddings_sync;
pub mod favorites;
pub mod tools;
pub mod users;

use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use zeno_core::ZenoError;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Map a core error onto the response taxonomy. Upstream bodies are passed
/// through for diagnostics.
pub fn fail(err: ZenoError) -> (StatusCode, String) {
    let status = match &err {
        ZenoError::Validation(_) => StatusCode::BAD_REQUEST,
        ZenoError::NotFound(_) => StatusCode::NOT_FOUND,
        ZenoError::Conflict(_) => StatusCode::CONFLICT,
        ZenoError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        ZenoError::MissingCredential(_) => StatusCode::SERVICE_UNAVAILABLE,
        ZenoError::Upstream { .. } | ZenoError::Json(_) | ZenoError::Http(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, err.to_string())
}
