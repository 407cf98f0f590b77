//! Order upload and listing handlers

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::State,
    http::{HeaderMap, StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
};

use crate::gateway::state::AppState;
use crate::gateway::types::{ApiError, ApiResponse};
use crate::orders::{OrderView, UploadOutcome};
use crate::user_auth::AuthenticatedUser;

/// Upload an order number for accrual
///
/// POST /api/user/orders (text/plain body)
#[utoipa::path(
    post,
    path = "/api/user/orders",
    request_body(content = String, content_type = "text/plain"),
    responses(
        (status = 200, description = "Order was already uploaded by this user"),
        (status = 202, description = "New order accepted for processing"),
        (status = 400, description = "Malformed request"),
        (status = 401, description = "Not authenticated"),
        (status = 409, description = "Order was uploaded by another user"),
        (status = 422, description = "Invalid order number"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Orders"
)]
pub async fn upload_order(
    State(state): State<Arc<AppState>>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
    headers: HeaderMap,
    body: String,
) -> Result<(StatusCode, Json<ApiResponse<()>>), ApiError> {
    let is_text = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_none_or(|ct| ct.starts_with("text/plain"));
    if !is_text {
        return Err(ApiError::bad_request("Content-Type must be text/plain"));
    }

    let number = body.trim();
    if number.is_empty() {
        return Err(ApiError::bad_request("Order number is required"));
    }

    let status = match state.orders.add(user, number).await? {
        UploadOutcome::Accepted => StatusCode::ACCEPTED,
        UploadOutcome::AlreadyUploaded => StatusCode::OK,
    };
    Ok((status, Json(ApiResponse::ok())))
}

/// List the caller's orders, oldest first
///
/// GET /api/user/orders
#[utoipa::path(
    get,
    path = "/api/user/orders",
    responses(
        (status = 200, description = "Uploaded orders", body = [OrderView]),
        (status = 204, description = "No orders uploaded yet"),
        (status = 401, description = "Not authenticated"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Orders"
)]
pub async fn list_orders(
    State(state): State<Arc<AppState>>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
) -> Result<Response, ApiError> {
    let orders = state.orders.list(user).await?;
    if orders.is_empty() {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }
    let views: Vec<OrderView> = orders.iter().map(OrderView::from).collect();
    Ok(Json(views).into_response())
}
