use axum::http::StatusCode;
use thiserror::Error;

use crate::db::StorageError;
use crate::gateway::types::error_codes;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Login is in use already")]
    LoginIsInUseAlready,

    #[error("Login/password pair does not exist")]
    PairLoginPasswordNotExist,

    #[error("Login and password must not be empty")]
    EmptyLoginOrPassword,

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl AuthError {
    pub fn code(&self) -> i32 {
        match self {
            AuthError::LoginIsInUseAlready => error_codes::LOGIN_TAKEN,
            AuthError::PairLoginPasswordNotExist => error_codes::AUTH_FAILED,
            AuthError::EmptyLoginOrPassword => error_codes::INVALID_PARAMETER,
            AuthError::Storage(_) => error_codes::INTERNAL_ERROR,
        }
    }

    pub fn http_status(&self) -> StatusCode {
        match self {
            AuthError::LoginIsInUseAlready => StatusCode::CONFLICT,
            AuthError::PairLoginPasswordNotExist => StatusCode::UNAUTHORIZED,
            AuthError::EmptyLoginOrPassword => StatusCode::BAD_REQUEST,
            AuthError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
