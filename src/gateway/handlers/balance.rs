//! Balance and withdrawal handlers

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::gateway::state::AppState;
use crate::gateway::types::{ApiError, ApiResponse};
use crate::ledger::{BalanceView, WithdrawRequest, WithdrawalView};
use crate::user_auth::AuthenticatedUser;

/// Current balance and total withdrawn
///
/// GET /api/user/balance
#[utoipa::path(
    get,
    path = "/api/user/balance",
    responses(
        (status = 200, description = "Balance", body = BalanceView),
        (status = 401, description = "Not authenticated"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Balance"
)]
pub async fn get_balance(
    State(state): State<Arc<AppState>>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
) -> Result<Json<BalanceView>, ApiError> {
    let balance = state.ledger.get(user).await?;
    Ok(Json(balance.into()))
}

/// Spend points against a new order
///
/// POST /api/user/balance/withdraw
#[utoipa::path(
    post,
    path = "/api/user/balance/withdraw",
    request_body = WithdrawRequest,
    responses(
        (status = 200, description = "Withdrawal recorded"),
        (status = 400, description = "Malformed request or non-positive sum"),
        (status = 401, description = "Not authenticated"),
        (status = 402, description = "Not enough funds"),
        (status = 422, description = "Invalid order number"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Balance"
)]
pub async fn withdraw(
    State(state): State<Arc<AppState>>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
    payload: Result<Json<WithdrawRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let Json(req) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;
    state.ledger.withdraw(user, req.order.trim(), req.sum).await?;
    Ok(Json(ApiResponse::ok()))
}

/// Withdrawal history, oldest first
///
/// GET /api/user/withdrawals
#[utoipa::path(
    get,
    path = "/api/user/withdrawals",
    responses(
        (status = 200, description = "Withdrawals", body = [WithdrawalView]),
        (status = 204, description = "No withdrawals yet"),
        (status = 401, description = "Not authenticated"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Balance"
)]
pub async fn list_withdrawals(
    State(state): State<Arc<AppState>>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
) -> Result<Response, ApiError> {
    let withdrawals = state.ledger.list(user).await?;
    if withdrawals.is_empty() {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }
    let views: Vec<WithdrawalView> = withdrawals.iter().map(WithdrawalView::from).collect();
    Ok(Json(views).into_response())
}
