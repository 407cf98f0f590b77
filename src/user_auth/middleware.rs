use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};
use std::sync::Arc;

use crate::core_types::UserId;
use crate::gateway::{
    state::AppState,
    types::{ApiError, error_codes},
};

/// Identity resolved from the session cookie
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser(pub UserId);

/// Cookie -> signature -> live session -> `AuthenticatedUser` extension.
pub async fn session_auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let token = state
        .cookies
        .token_from_headers(request.headers())
        .map_err(|e| {
            tracing::debug!("Rejected session cookie: {}", e);
            ApiError::from(e)
        })?;

    let user = state.sessions.authenticate(&token).ok_or_else(|| {
        ApiError::unauthorized(error_codes::SESSION_EXPIRED, "Session is expired")
    })?;

    request.extensions_mut().insert(AuthenticatedUser(user));
    Ok(next.run(request).await)
}
