//! Shared fixture for API integration tests: in-memory backends,
//! deterministic fake providers, and request helpers.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use futures::stream::BoxStream;
use futures::StreamExt;
use std::sync::Arc;
use tower::ServiceExt;
use zeno_core::{
    ChatModel, EmbeddingProvider, MemoryAuth, MemoryDirectory, MemoryKv, MemoryVectors,
    Result as ZenoResult,
};
use zeno_server::{app::app, config::Config, state::AppState};
use zeno_types::{AuthUser, ChatMessage, Role};

pub const PASSWORD: &str = "hunter2";
pub const ADMIN_TOKEN: &str = "admin-token";
pub const ADMIN_ID: &str = "admin-id";
pub const USER_TOKEN: &str = "user-token";
pub const USER_ID: &str = "user-id";

/// Embeds text as a small deterministic vector so similarity search has
/// something real to rank.
pub struct FakeEmbeddings;

fn fake_vector(text: &str) -> Vec<f32> {
    let bytes = text.as_bytes();
    let sum: u32 = bytes.iter().map(|b| *b as u32).sum();
    vec![
        text.len() as f32,
        sum as f32 % 97.0,
        bytes.first().copied().unwrap_or(0) as f32,
        bytes.last().copied().unwrap_or(0) as f32,
    ]
}

#[async_trait]
impl EmbeddingProvider for FakeEmbeddings {
    fn model_name(&self) -> &str {
        "fake-embeddings"
    }
    fn dims(&self) -> usize {
        4
    }
    async fn embed(&self, texts: &[String]) -> ZenoResult<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| fake_vector(t)).collect())
    }
}

/// Echoes the last user message back, buffered or word-by-word.
pub struct FakeChat;

fn last_user_message(messages: &[ChatMessage]) -> String {
    messages
        .iter()
        .rev()
        .find(|m| m.role == zeno_types::ChatRole::User)
        .map(|m| m.content.clone())
        .unwrap_or_default()
}

#[async_trait]
impl ChatModel for FakeChat {
    fn model_name(&self) -> &str {
        "fake-chat"
    }
    async fn complete(&self, messages: &[ChatMessage]) -> ZenoResult<String> {
        Ok(format!("answer: {}", last_user_message(messages)))
    }
    async fn complete_stream(
        &self,
        messages: &[ChatMessage],
    ) -> ZenoResult<BoxStream<'static, ZenoResult<String>>> {
        let reply = format!("answer: {}", last_user_message(messages));
        let chunks: Vec<ZenoResult<String>> =
            reply.split(' ').map(|w| Ok(w.to_string())).collect();
        Ok(futures::stream::iter(chunks).boxed())
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
}

/// Build the app on in-memory backends with one admin and one standard
/// user signed in.
pub fn test_app() -> TestApp {
    let config = Config {
        portal_password: Some(PASSWORD.to_string()),
        ..Config::default()
    };

    let auth = Arc::new(MemoryAuth::new());
    auth.issue(
        ADMIN_TOKEN,
        AuthUser {
            id: ADMIN_ID.to_string(),
            email: "admin@zeno.dev".to_string(),
        },
    );
    auth.issue(
        USER_TOKEN,
        AuthUser {
            id: USER_ID.to_string(),
            email: "user@zeno.dev".to_string(),
        },
    );

    let directory = Arc::new(MemoryDirectory::new());
    directory.seed_user(ADMIN_ID, "admin@zeno.dev", Role::Admin);
    directory.seed_user(USER_ID, "user@zeno.dev", Role::Standard);

    let state = Arc::new(AppState::with_backends(
        config,
        Arc::new(MemoryKv::new()),
        Arc::new(MemoryVectors::new()),
        Arc::new(FakeEmbeddings),
        Arc::new(FakeChat),
        auth,
        directory,
    ));

    TestApp {
        router: app(state.clone()),
        state,
    }
}

/// Issue one request with both gate headers and an optional JSON body.
pub async fn call(
    router: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    builder = builder.header("x-portal-password", PASSWORD);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }

    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::String(
            String::from_utf8_lossy(&bytes).to_string(),
        ))
    };
    (status, value)
}

/// Create a tool through the API and return its id.
pub async fn create_tool(router: &Router, title: &str) -> uuid::Uuid {
    let (status, body) = call(
        router,
        "POST",
        "/api/tools",
        Some(USER_TOKEN),
        Some(serde_json::json!({
            "title": title,
            "description": format!("{title} does things"),
            "url": "https://example.com",
            "tags": ["testing"],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create_tool failed: {body}");
    body["id"].as_str().unwrap().parse().unwrap()
}
