//! REST endpoints for the mock account flow.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;

use crate::server::ApiError;

use super::stub::AccountStub;

/// Shared state for account routes.
#[derive(Clone)]
pub struct AccountRouteState {
    pub accounts: Arc<AccountStub>,
}

#[derive(Debug, Deserialize)]
struct OtpRequest {
    phone: String,
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    phone: String,
    otp: String,
}

#[derive(Debug, Deserialize)]
struct SignupRequest {
    name: String,
    phone: String,
}

/// POST /api/auth/otp
async fn request_otp(
    State(state): State<AccountRouteState>,
    Json(req): Json<OtpRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state.accounts.request_otp(&req.phone).await?;
    Ok(Json(serde_json::json!({
        "sent": true,
        "message": "A verification code has been sent to your phone."
    })))
}

/// POST /api/auth/login
async fn login(
    State(state): State<AccountRouteState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.accounts.login(&req.phone, &req.otp).await?;
    Ok(Json(user))
}

/// POST /api/auth/signup
async fn signup(
    State(state): State<AccountRouteState>,
    Json(req): Json<SignupRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.accounts.signup(&req.name, &req.phone).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// POST /api/auth/logout
async fn logout(State(state): State<AccountRouteState>) -> Result<impl IntoResponse, ApiError> {
    state.accounts.logout().await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/auth/me
///
/// The signed-in user, or 401 if nobody is signed in.
async fn me(State(state): State<AccountRouteState>) -> impl IntoResponse {
    match state.accounts.current().await {
        Some(user) => Json(user).into_response(),
        None => (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({"error": "Not signed in"})),
        )
            .into_response(),
    }
}

/// Build the account REST routes.
pub fn account_routes(state: AccountRouteState) -> Router {
    Router::new()
        .route("/api/auth/otp", post(request_otp))
        .route("/api/auth/login", post(login))
        .route("/api/auth/signup", post(signup))
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/me", get(me))
        .with_state(state)
}
