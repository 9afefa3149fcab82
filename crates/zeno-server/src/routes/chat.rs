//! Chat routes: retrieval-augmented answers, buffered or streamed.

use axum::{
    extract::State,
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    Json,
};
use futures::{stream, StreamExt};
use std::convert::Infallible;
use std::sync::Arc;
use zeno_types::{AnalyticsEvent, AnalyticsEventType, ChatRequest, ChatStatus};

use crate::routes::fail;
use crate::state::AppState;

async fn record_event(state: &AppState, event_type: AnalyticsEventType, data: serde_json::Value) {
    // Telemetry never fails the chat request.
    let event = AnalyticsEvent::new(event_type, data);
    if let Err(e) = state.analytics.record(&event).await {
        tracing::warn!(target: "zeno::analytics", "Failed to record {}: {}", event_type.as_str(), e);
    }
}

pub async fn status(State(state): State<Arc<AppState>>) -> Json<ChatStatus> {
    Json(state.chat.status().await)
}

pub async fn ask(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> Result<Response, (StatusCode, String)> {
    if request.stream {
        let (tools, deltas) = state.chat.answer_stream(&request).await.map_err(fail)?;
        record_event(
            &state,
            AnalyticsEventType::ChatQuery,
            serde_json::json!({ "length": request.message.len(), "streamed": true }),
        )
        .await;

        let context = stream::once(async move {
            let payload = serde_json::to_string(&tools).unwrap_or_else(|_| "[]".to_string());
            Ok::<_, Infallible>(Event::default().event("tools").data(payload))
        });
        let deltas = deltas.map(|chunk| {
            Ok(match chunk {
                Ok(text) => Event::default()
                    .event("delta")
                    .data(serde_json::to_string(&text).unwrap_or_default()),
                Err(e) => Event::default()
                    .event("error")
                    .data(serde_json::to_string(&e.to_string()).unwrap_or_default()),
            })
        });
        let state_for_done = state.clone();
        let done = stream::once(async move {
            record_event(
                &state_for_done,
                AnalyticsEventType::ChatResponse,
                serde_json::json!({ "streamed": true }),
            )
            .await;
            Ok(Event::default().event("done").data("{}"))
        });

        let events = context.chain(deltas).chain(done);
        Ok(Sse::new(events).keep_alive(KeepAlive::default()).into_response())
    } else {
        let answer = state.chat.answer(&request).await.map_err(fail)?;
        record_event(
            &state,
            AnalyticsEventType::ChatQuery,
            serde_json::json!({ "length": request.message.len() }),
        )
        .await;
        record_event(
            &state,
            AnalyticsEventType::ChatResponse,
            serde_json::json!({ "length": answer.reply.len(), "tools": answer.tools.len() }),
        )
        .await;
        Ok(Json(answer).into_response())
    }
}
