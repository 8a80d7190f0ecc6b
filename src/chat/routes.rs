//! REST endpoints for driving the chat.

use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;

use crate::server::ApiError;

use super::service::ChatService;
use super::ws::ws_chat_handler;

/// Shared state for chat routes.
#[derive(Clone)]
pub struct ChatRouteState {
    pub chat: Arc<ChatService>,
}

#[derive(Debug, Deserialize)]
struct AnswerRequest {
    answer: String,
}

/// GET /api/flow
///
/// The questionnaire in visiting order.
async fn get_flow(State(state): State<ChatRouteState>) -> impl IntoResponse {
    let nodes: Vec<_> = state.chat.flow().iter().cloned().collect();
    Json(nodes)
}

/// GET /api/chat
async fn get_chat(State(state): State<ChatRouteState>) -> impl IntoResponse {
    Json(state.chat.snapshot().await)
}

/// POST /api/chat/start
async fn start_chat(State(state): State<ChatRouteState>) -> impl IntoResponse {
    Json(state.chat.start().await)
}

/// POST /api/chat/answer
///
/// Returns the session right after the answer was recorded; the assistant's
/// next message follows over the WebSocket (or on the next GET).
async fn answer(
    State(state): State<ChatRouteState>,
    Json(req): Json<AnswerRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let snapshot = state.chat.answer(&req.answer).await?;
    Ok(Json(snapshot))
}

/// POST /api/chat/reset
async fn reset_chat(State(state): State<ChatRouteState>) -> impl IntoResponse {
    Json(state.chat.reset().await)
}

/// POST /api/chat/complete
///
/// Finalizes the session and returns the submitted record.
async fn complete_chat(
    State(state): State<ChatRouteState>,
) -> Result<impl IntoResponse, ApiError> {
    let record = state.chat.complete().await?;
    Ok(Json(record))
}

/// Build the chat REST + WebSocket routes.
pub fn chat_routes(state: ChatRouteState) -> Router {
    Router::new()
        .route("/ws/chat", get(ws_chat_handler))
        .route("/api/flow", get(get_flow))
        .route("/api/chat", get(get_chat))
        .route("/api/chat/start", post(start_chat))
        .route("/api/chat/answer", post(answer))
        .route("/api/chat/reset", post(reset_chat))
        .route("/api/chat/complete", post(complete_chat))
        .with_state(state)
}
