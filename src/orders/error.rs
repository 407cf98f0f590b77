use axum::http::StatusCode;
use thiserror::Error;

use crate::db::StorageError;
use crate::gateway::types::error_codes;
use crate::order_number::OrderNumberError;

#[derive(Error, Debug)]
pub enum OrderError {
    #[error("Invalid order number: {0}")]
    InvalidNumberFormat(#[from] OrderNumberError),

    #[error("Order has already been uploaded by another user")]
    AlreadyUploadedByAnotherUser,

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl OrderError {
    pub fn code(&self) -> i32 {
        match self {
            OrderError::InvalidNumberFormat(_) => error_codes::INVALID_ORDER_NUMBER,
            OrderError::AlreadyUploadedByAnotherUser => error_codes::ORDER_OWNED_BY_OTHER,
            OrderError::Storage(_) => error_codes::INTERNAL_ERROR,
        }
    }

    pub fn http_status(&self) -> StatusCode {
        match self {
            OrderError::InvalidNumberFormat(_) => StatusCode::UNPROCESSABLE_ENTITY,
            OrderError::AlreadyUploadedByAnotherUser => StatusCode::CONFLICT,
            OrderError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
