//! Router assembly.

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{auth_layer, routes, state::AppState};

/// The full application router, `/api`-nested, gated, CORS-open, traced.
pub fn app(state: Arc<AppState>) -> Router {
    let public = Router::new()
        .route("/health", get(routes::health))
        .route("/auth/password", post(routes::auth::verify_password));

    let protected = Router::new()
        .route("/auth/session", get(routes::auth::session))
        .route("/auth/logout", post(routes::auth::logout))
        // Config documents
        .route(
            "/config/{kind}",
            get(routes::config::get)
                .post(routes::config::set)
                .delete(routes::config::delete),
        )
        // Tool catalog
        .route("/tools", get(routes::tools::list).post(routes::tools::create))
        .route(
            "/tools/{id}",
            get(routes::tools::get)
                .put(routes::tools::update)
                .delete(routes::tools::delete),
        )
        // Chat over the catalog
        .route("/chat", get(routes::chat::status).post(routes::chat::ask))
        // Usage analytics
        .route(
            "/analytics",
            get(routes::analytics::summary).post(routes::analytics::record),
        )
        // Embedding sync
        .route(
            "/embeddings-sync",
            get(routes::embeddings_sync::stats).post(routes::embeddings_sync::run),
        )
        // Favorites
        .route(
            "/favorites",
            get(routes::favorites::list)
                .post(routes::favorites::add)
                .put(routes::favorites::update_note)
                .delete(routes::favorites::remove),
        )
        // User management
        .route("/users", get(routes::users::list))
        .route(
            "/users/{id}",
            put(routes::users::update).delete(routes::users::delete),
        )
        // Comments
        .route(
            "/comments",
            get(routes::comments::list).post(routes::comments::add),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_layer::require_gates,
        ));

    Router::new()
        .nest("/api", public.merge(protected))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
