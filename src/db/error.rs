use thiserror::Error;

/// Failures at the persistence boundary.
///
/// Never shown to API clients in detail; handlers log the full error and
/// answer with a generic 500.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Corrupted row: {0}")]
    Corrupted(String),
}
