//! HTTP server assembly: merges the route sets and maps errors to JSON.

use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use crate::account::{AccountRouteState, AccountStub, account_routes};
use crate::chat::{ChatRouteState, ChatService, chat_routes};
use crate::error::{AccountError, SessionError, SubmissionError};

/// An error response: status code plus `{"error": message}` body.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(serde_json::json!({ "error": self.message })),
        )
            .into_response()
    }
}

impl From<SessionError> for ApiError {
    fn from(e: SessionError) -> Self {
        let status = match e {
            SessionError::InvalidAnswer { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            SessionError::NotActive
            | SessionError::AlreadyComplete
            | SessionError::ReplyPending => StatusCode::CONFLICT,
        };
        Self::new(status, e.to_string())
    }
}

impl From<SubmissionError> for ApiError {
    fn from(e: SubmissionError) -> Self {
        Self::new(StatusCode::BAD_GATEWAY, e.to_string())
    }
}

impl From<AccountError> for ApiError {
    fn from(e: AccountError) -> Self {
        let status = match e {
            AccountError::InvalidPhone(_) | AccountError::EmptyName => StatusCode::BAD_REQUEST,
            AccountError::InvalidOtp => StatusCode::UNAUTHORIZED,
            AccountError::Io(_) | AccountError::Json(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, e.to_string())
    }
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "legal-intake"
    }))
}

/// Build the full application router: health, chat, and account routes.
pub fn build_router(chat: Arc<ChatService>, accounts: Arc<AccountStub>) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(chat_routes(ChatRouteState { chat }))
        .merge(account_routes(AccountRouteState { accounts }))
        .layer(ServiceBuilder::new().layer(CorsLayer::permissive()))
}
