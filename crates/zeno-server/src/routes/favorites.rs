//! Per-user favorites.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;
use zeno_types::{AnalyticsEvent, AnalyticsEventType, Favorite, Identity};

use crate::routes::fail;
use crate::state::AppState;

pub async fn list(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<Vec<Favorite>>, (StatusCode, String)> {
    let favorites = state
        .directory
        .list_favorites(&identity.user.id)
        .await
        .map_err(fail)?;
    Ok(Json(favorites))
}

#[derive(Deserialize)]
pub struct AddFavoriteRequest {
    #[serde(rename = "toolId")]
    pub tool_id: Uuid,
    #[serde(default)]
    pub note: Option<String>,
}

pub async fn add(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Json(request): Json<AddFavoriteRequest>,
) -> Result<(StatusCode, Json<Favorite>), (StatusCode, String)> {
    // Favoriting an unknown tool is a 404, not a dangling relation.
    state.catalog.get(request.tool_id).await.map_err(fail)?;

    let favorite = state
        .directory
        .add_favorite(Favorite {
            user_id: identity.user.id.clone(),
            tool_id: request.tool_id,
            note: request.note,
            created_at: Utc::now(),
        })
        .await
        .map_err(fail)?;

    let event = AnalyticsEvent::new(
        AnalyticsEventType::ToolFavorite,
        serde_json::json!({ "toolId": request.tool_id.to_string() }),
    );
    if let Err(e) = state.analytics.record(&event).await {
        tracing::warn!(target: "zeno::analytics", "Failed to record tool_favorite: {}", e);
    }

    Ok((StatusCode::CREATED, Json(favorite)))
}

#[derive(Deserialize)]
pub struct UpdateFavoriteRequest {
    #[serde(rename = "toolId")]
    pub tool_id: Uuid,
    pub note: Option<String>,
}

pub async fn update_note(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Json(request): Json<UpdateFavoriteRequest>,
) -> Result<Json<Favorite>, (StatusCode, String)> {
    let favorite = state
        .directory
        .update_favorite_note(&identity.user.id, request.tool_id, request.note)
        .await
        .map_err(fail)?;
    Ok(Json(favorite))
}

#[derive(Deserialize)]
pub struct FavoriteQuery {
    #[serde(rename = "toolId")]
    pub tool_id: Uuid,
}

pub async fn remove(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Query(query): Query<FavoriteQuery>,
) -> Result<StatusCode, (StatusCode, String)> {
    state
        .directory
        .remove_favorite(&identity.user.id, query.tool_id)
        .await
        .map_err(fail)?;
    Ok(StatusCode::NO_CONTENT)
}
