//! Integration tests for comments, favorites, and user management.

mod common;

use axum::http::StatusCode;
use common::{call, create_tool, test_app, ADMIN_TOKEN, USER_ID, USER_TOKEN};
use serde_json::json;

#[tokio::test]
async fn comment_round_trip_and_validation() {
    let app = test_app();
    let tool_id = create_tool(&app.router, "Commented").await;

    // Missing message is rejected and nothing is stored.
    let (status, _) = call(
        &app.router,
        "POST",
        "/api/comments",
        Some(USER_TOKEN),
        Some(json!({ "toolId": tool_id, "name": "ada", "message": "" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, listed) = call(&app.router, "GET", "/api/comments", Some(USER_TOKEN), None).await;
    assert!(listed.as_array().unwrap().is_empty());

    let (status, comment) = call(
        &app.router,
        "POST",
        "/api/comments",
        Some(USER_TOKEN),
        Some(json!({
            "toolId": tool_id,
            "name": "ada",
            "message": "works well",
            "priority": "high"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(comment["id"].is_string());
    assert_eq!(comment["priority"], "high");

    let (_, listed) = call(
        &app.router,
        "GET",
        &format!("/api/comments?toolId={tool_id}"),
        Some(USER_TOKEN),
        None,
    )
    .await;
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let (_, other) = call(
        &app.router,
        "GET",
        &format!("/api/comments?toolId={}", uuid::Uuid::new_v4()),
        Some(USER_TOKEN),
        None,
    )
    .await;
    assert!(other.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn duplicate_favorite_is_a_conflict() {
    let app = test_app();
    let tool_id = create_tool(&app.router, "Loved").await;
    let payload = json!({ "toolId": tool_id, "note": "daily driver" });

    let (status, favorite) = call(
        &app.router,
        "POST",
        "/api/favorites",
        Some(USER_TOKEN),
        Some(payload.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(favorite["user_id"], USER_ID);

    let (status, _) = call(
        &app.router,
        "POST",
        "/api/favorites",
        Some(USER_TOKEN),
        Some(payload),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, listed) = call(&app.router, "GET", "/api/favorites", Some(USER_TOKEN), None).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn favoriting_unknown_tool_is_404() {
    let app = test_app();
    let (status, _) = call(
        &app.router,
        "POST",
        "/api/favorites",
        Some(USER_TOKEN),
        Some(json!({ "toolId": uuid::Uuid::new_v4() })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn favorite_note_update_and_removal() {
    let app = test_app();
    let tool_id = create_tool(&app.router, "Noted").await;
    call(
        &app.router,
        "POST",
        "/api/favorites",
        Some(USER_TOKEN),
        Some(json!({ "toolId": tool_id })),
    )
    .await;

    let (status, favorite) = call(
        &app.router,
        "PUT",
        "/api/favorites",
        Some(USER_TOKEN),
        Some(json!({ "toolId": tool_id, "note": "revised" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(favorite["note"], "revised");

    let (status, _) = call(
        &app.router,
        "DELETE",
        &format!("/api/favorites?toolId={tool_id}"),
        Some(USER_TOKEN),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, listed) = call(&app.router, "GET", "/api/favorites", Some(USER_TOKEN), None).await;
    assert!(listed.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn user_management_is_admin_only() {
    let app = test_app();

    let (status, _) = call(&app.router, "GET", "/api/users", Some(USER_TOKEN), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, users) = call(&app.router, "GET", "/api/users", Some(ADMIN_TOKEN), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(users.as_array().unwrap().len(), 2);

    let (status, updated) = call(
        &app.router,
        "PUT",
        &format!("/api/users/{USER_ID}"),
        Some(ADMIN_TOKEN),
        Some(json!({ "role": "admin" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["role"], "admin");

    let (status, _) = call(
        &app.router,
        "DELETE",
        &format!("/api/users/{USER_ID}"),
        Some(ADMIN_TOKEN),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = call(
        &app.router,
        "DELETE",
        "/api/users/ghost",
        Some(ADMIN_TOKEN),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
