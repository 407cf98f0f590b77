//! API response envelope, error codes and error-to-response mapping
//!
//! - `ApiResponse<T>`: unified response wrapper
//! - `error_codes`: stable numeric codes
//! - `ApiError`: anything a handler can fail with, rendered as
//!   `{code, msg}` with the matching HTTP status

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::ledger::LedgerError;
use crate::orders::OrderError;
use crate::session::CookieError;
use crate::user_auth::AuthError;

// ============================================================================
// Unified API Response Format
// ============================================================================

/// Unified API response wrapper
///
/// - code: 0 = success, non-zero = error code
/// - msg: short message description
/// - data: payload on success, absent on error
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    #[schema(example = 0)]
    pub code: i32,
    #[schema(example = "ok")]
    pub msg: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            code: error_codes::SUCCESS,
            msg: "ok".to_string(),
            data: Some(data),
        }
    }

    pub fn error(code: i32, msg: impl Into<String>) -> ApiResponse<()> {
        ApiResponse {
            code,
            msg: msg.into(),
            data: None,
        }
    }
}

impl ApiResponse<()> {
    /// Success without payload
    pub fn ok() -> Self {
        Self {
            code: error_codes::SUCCESS,
            msg: "ok".to_string(),
            data: None,
        }
    }
}

// ============================================================================
// Error Codes
// ============================================================================

/// Standard API error codes
pub mod error_codes {
    pub const SUCCESS: i32 = 0;

    // Client errors (1xxx)
    pub const INVALID_PARAMETER: i32 = 1001;
    pub const INSUFFICIENT_BALANCE: i32 = 1002;
    pub const INVALID_ORDER_NUMBER: i32 = 1003;

    // Auth errors (2xxx)
    pub const MISSING_AUTH: i32 = 2001;
    pub const AUTH_FAILED: i32 = 2002;
    pub const SESSION_EXPIRED: i32 = 2003;

    // Conflicts (4xxx)
    pub const ORDER_OWNED_BY_OTHER: i32 = 4091;
    pub const LOGIN_TAKEN: i32 = 4092;

    // Server errors (5xxx)
    pub const INTERNAL_ERROR: i32 = 5000;
    pub const SERVICE_UNAVAILABLE: i32 = 5001;
}

// ============================================================================
// Handler errors
// ============================================================================

/// Error returned by handlers and middleware
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: i32,
    pub msg: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: i32, msg: impl Into<String>) -> Self {
        Self {
            status,
            code,
            msg: msg.into(),
        }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, error_codes::INVALID_PARAMETER, msg)
    }

    pub fn unauthorized(code: i32, msg: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, code, msg)
    }

    /// Generic 500; callers log the underlying error themselves.
    pub fn internal() -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            error_codes::INTERNAL_ERROR,
            "Internal server error",
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ApiResponse::<()>::error(self.code, self.msg)),
        )
            .into_response()
    }
}

impl From<OrderError> for ApiError {
    fn from(e: OrderError) -> Self {
        if let OrderError::Storage(ref inner) = e {
            tracing::error!("Order storage failure: {:?}", inner);
            return ApiError::internal();
        }
        ApiError::new(e.http_status(), e.code(), e.to_string())
    }
}

impl From<LedgerError> for ApiError {
    fn from(e: LedgerError) -> Self {
        if let LedgerError::Storage(ref inner) = e {
            tracing::error!("Ledger storage failure: {:?}", inner);
            return ApiError::internal();
        }
        ApiError::new(e.http_status(), e.code(), e.to_string())
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        if let AuthError::Storage(ref inner) = e {
            tracing::error!("Credential storage failure: {:?}", inner);
            return ApiError::internal();
        }
        ApiError::new(e.http_status(), e.code(), e.to_string())
    }
}

impl From<CookieError> for ApiError {
    fn from(e: CookieError) -> Self {
        let code = match e {
            CookieError::Missing => error_codes::MISSING_AUTH,
            _ => error_codes::AUTH_FAILED,
        };
        ApiError::unauthorized(code, e.to_string())
    }
}
