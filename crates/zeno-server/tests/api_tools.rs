//! Integration tests for the tool catalog and config document routes.

mod common;

use axum::http::StatusCode;
use common::{call, create_tool, test_app, ADMIN_TOKEN, USER_TOKEN};
use serde_json::json;

#[tokio::test]
async fn create_tool_returns_id_and_listing_has_it_once() {
    let app = test_app();

    let (status, body) = call(
        &app.router,
        "POST",
        "/api/tools",
        Some(USER_TOKEN),
        Some(json!({
            "title": "X",
            "description": "Y",
            "url": "https://x"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    let id = body["id"].as_str().expect("generated id");
    assert!(body["date_added"].is_string());

    let (status, listing) = call(&app.router, "GET", "/api/tools", Some(USER_TOKEN), None).await;
    assert_eq!(status, StatusCode::OK);
    let occurrences = listing
        .as_array()
        .unwrap()
        .iter()
        .filter(|t| t["id"] == id)
        .count();
    assert_eq!(occurrences, 1);
}

#[tokio::test]
async fn create_tool_missing_fields_is_rejected() {
    let app = test_app();

    let (status, body) = call(
        &app.router,
        "POST",
        "/api/tools",
        Some(USER_TOKEN),
        Some(json!({ "title": "X", "description": "", "url": "https://x" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.as_str().unwrap().contains("description"));

    let (_, listing) = call(&app.router, "GET", "/api/tools", Some(USER_TOKEN), None).await;
    assert!(listing.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn update_overwrites_fields_and_bumps_date_modified() {
    let app = test_app();
    let id = create_tool(&app.router, "Original").await;

    let (_, before) = call(
        &app.router,
        "GET",
        &format!("/api/tools/{id}"),
        Some(USER_TOKEN),
        None,
    )
    .await;

    let (status, after) = call(
        &app.router,
        "PUT",
        &format!("/api/tools/{id}"),
        Some(USER_TOKEN),
        Some(json!({ "title": "Renamed", "tier": "pro" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(after["title"], "Renamed");
    assert_eq!(after["tier"], "pro");
    // Unsubmitted fields keep their values.
    assert_eq!(after["description"], before["description"]);
    let parse = |v: &serde_json::Value| {
        chrono::DateTime::parse_from_rfc3339(v.as_str().unwrap()).unwrap()
    };
    assert!(
        parse(&after["date_modified"]) > parse(&before["date_modified"]),
        "date_modified must strictly increase"
    );
}

#[tokio::test]
async fn update_and_delete_unknown_tool_are_404() {
    let app = test_app();
    create_tool(&app.router, "Keep").await;
    let ghost = uuid::Uuid::new_v4();

    let (status, _) = call(
        &app.router,
        "PUT",
        &format!("/api/tools/{ghost}"),
        Some(USER_TOKEN),
        Some(json!({ "title": "nope" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = call(
        &app.router,
        "DELETE",
        &format!("/api/tools/{ghost}"),
        Some(USER_TOKEN),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // The catalog is untouched.
    let (_, listing) = call(&app.router, "GET", "/api/tools", Some(USER_TOKEN), None).await;
    assert_eq!(listing.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn config_documents_round_trip_for_admins() {
    let app = test_app();

    let (status, _) = call(
        &app.router,
        "GET",
        "/api/config/app",
        Some(USER_TOKEN),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Standard users cannot write config.
    let (status, _) = call(
        &app.router,
        "POST",
        "/api/config/app",
        Some(USER_TOKEN),
        Some(json!({ "theme": "dark" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = call(
        &app.router,
        "POST",
        "/api/config/app",
        Some(ADMIN_TOKEN),
        Some(json!({ "theme": "dark" })),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, doc) = call(
        &app.router,
        "GET",
        "/api/config/app",
        Some(USER_TOKEN),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(doc["theme"], "dark");

    let (status, _) = call(
        &app.router,
        "DELETE",
        "/api/config/app",
        Some(ADMIN_TOKEN),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn unknown_config_kind_is_rejected() {
    let app = test_app();
    let (status, _) = call(
        &app.router,
        "GET",
        "/api/config/secrets",
        Some(USER_TOKEN),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
