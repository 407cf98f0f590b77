use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::header::SET_COOKIE,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use super::service::AuthRequest;
use crate::core_types::UserId;
use crate::gateway::{
    state::AppState,
    types::{ApiError, ApiResponse},
};

/// Register a new user
///
/// POST /api/user/register
#[utoipa::path(
    post,
    path = "/api/user/register",
    request_body = AuthRequest,
    responses(
        (status = 200, description = "User registered and authenticated; session cookie set"),
        (status = 400, description = "Malformed request"),
        (status = 409, description = "Login is in use already"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Auth"
)]
pub async fn register(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<AuthRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(req) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let user = state.credentials.sign_in(&req.login, &req.password).await?;
    start_session(&state, user)
}

/// Login user
///
/// POST /api/user/login
#[utoipa::path(
    post,
    path = "/api/user/login",
    request_body = AuthRequest,
    responses(
        (status = 200, description = "Login successful; session cookie set"),
        (status = 400, description = "Malformed request"),
        (status = 401, description = "Invalid login/password pair"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Auth"
)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<AuthRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(req) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let user = state.credentials.login(&req.login, &req.password).await?;
    start_session(&state, user)
}

fn start_session(state: &AppState, user: UserId) -> Result<Response, ApiError> {
    let token = state.sessions.add_new_session(user);
    let cookie = state.cookies.set_cookie_header(&token).map_err(|e| {
        tracing::error!("Failed to sign session cookie: {}", e);
        ApiError::internal()
    })?;
    Ok(([(SET_COOKIE, cookie)], Json(ApiResponse::ok())).into_response())
}
