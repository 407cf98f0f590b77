use async_trait::async_trait;

use crate::core_types::UserId;
use crate::db::StorageError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignUpOutcome {
    Created,
    /// Another registration claimed the login first; nothing was written
    LoginTaken,
}

/// Credential persistence. Only password digests are ever stored.
#[async_trait]
pub trait CredentialRepository: Send + Sync {
    /// Create the user row and its credential row in one transaction.
    async fn create_user_with_credential(
        &self,
        user: UserId,
        login: &str,
        password_digest: &str,
    ) -> Result<SignUpOutcome, StorageError>;

    async fn read_credential_by_login(&self, login: &str) -> Result<Option<UserId>, StorageError>;

    async fn read_credential_by_login_and_password(
        &self,
        login: &str,
        password_digest: &str,
    ) -> Result<Option<UserId>, StorageError>;
}
