use axum::http::StatusCode;
use thiserror::Error;

use crate::db::StorageError;
use crate::gateway::types::error_codes;
use crate::order_number::OrderNumberError;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Invalid order number: {0}")]
    InvalidNumberFormat(#[from] OrderNumberError),

    #[error("Invalid amount: must be positive")]
    InvalidAmount,

    #[error("Not enough funds")]
    NotEnoughFund,

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl LedgerError {
    pub fn code(&self) -> i32 {
        match self {
            LedgerError::InvalidNumberFormat(_) => error_codes::INVALID_ORDER_NUMBER,
            LedgerError::InvalidAmount => error_codes::INVALID_PARAMETER,
            LedgerError::NotEnoughFund => error_codes::INSUFFICIENT_BALANCE,
            LedgerError::Storage(_) => error_codes::INTERNAL_ERROR,
        }
    }

    pub fn http_status(&self) -> StatusCode {
        match self {
            LedgerError::InvalidNumberFormat(_) => StatusCode::UNPROCESSABLE_ENTITY,
            LedgerError::InvalidAmount => StatusCode::BAD_REQUEST,
            LedgerError::NotEnoughFund => StatusCode::PAYMENT_REQUIRED,
            LedgerError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
