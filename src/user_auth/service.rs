use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::{info, warn};
use utoipa::ToSchema;

use super::error::AuthError;
use super::repository::{CredentialRepository, SignUpOutcome};
use crate::core_types::UserId;

/// Body of both register and login requests
#[derive(Debug, Deserialize, ToSchema)]
pub struct AuthRequest {
    #[schema(example = "alice")]
    pub login: String,
    #[schema(example = "correct horse battery staple")]
    pub password: String,
}

/// SHA-256 over `password || salt`, URL-safe base64
#[derive(Clone)]
pub struct SaltedHasher {
    salt: Vec<u8>,
}

impl SaltedHasher {
    pub fn new(salt: impl Into<Vec<u8>>) -> Self {
        Self { salt: salt.into() }
    }

    pub fn digest(&self, password: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(password.as_bytes());
        hasher.update(&self.salt);
        URL_SAFE.encode(hasher.finalize())
    }
}

/// Registration and login.
///
/// Nothing about credentials is kept in memory: every call goes to the
/// repository with the digest only.
pub struct CredentialManager {
    repo: Arc<dyn CredentialRepository>,
    hasher: SaltedHasher,
}

impl CredentialManager {
    pub fn new(repo: Arc<dyn CredentialRepository>, hasher: SaltedHasher) -> Self {
        Self { repo, hasher }
    }

    /// Register a new user under `login`.
    pub async fn sign_in(&self, login: &str, password: &str) -> Result<UserId, AuthError> {
        validate(login, password)?;

        if self.repo.read_credential_by_login(login).await?.is_some() {
            warn!(login, "registration attempt for existing login");
            return Err(AuthError::LoginIsInUseAlready);
        }

        let user = UserId::new();
        let digest = self.hasher.digest(password);
        match self
            .repo
            .create_user_with_credential(user, login, &digest)
            .await?
        {
            SignUpOutcome::Created => {
                info!(user_id = %user, login, "user registered");
                Ok(user)
            }
            SignUpOutcome::LoginTaken => Err(AuthError::LoginIsInUseAlready),
        }
    }

    pub async fn login(&self, login: &str, password: &str) -> Result<UserId, AuthError> {
        validate(login, password)?;
        let digest = self.hasher.digest(password);
        self.repo
            .read_credential_by_login_and_password(login, &digest)
            .await?
            .ok_or(AuthError::PairLoginPasswordNotExist)
    }
}

fn validate(login: &str, password: &str) -> Result<(), AuthError> {
    if login.is_empty() || password.is_empty() {
        return Err(AuthError::EmptyLoginOrPassword);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;

    fn manager() -> CredentialManager {
        CredentialManager::new(Arc::new(MemoryStore::new()), SaltedHasher::new("pepper"))
    }

    #[test]
    fn test_digest_is_salted_sha256() {
        let h = SaltedHasher::new("salt");
        let expected = URL_SAFE.encode(Sha256::digest(b"passwordsalt"));
        assert_eq!(h.digest("password"), expected);
        assert_ne!(h.digest("password"), SaltedHasher::new("other").digest("password"));
        assert_ne!(h.digest("password"), h.digest("Password"));
    }

    #[tokio::test]
    async fn test_sign_in_then_login() {
        let m = manager();
        let user = m.sign_in("alice", "secret").await.unwrap();
        assert_eq!(m.login("alice", "secret").await.unwrap(), user);
    }

    #[tokio::test]
    async fn test_duplicate_login_rejected() {
        let m = manager();
        m.sign_in("alice", "secret").await.unwrap();
        assert!(matches!(
            m.sign_in("alice", "another").await,
            Err(AuthError::LoginIsInUseAlready)
        ));
        // original password still works
        assert!(m.login("alice", "secret").await.is_ok());
    }

    #[tokio::test]
    async fn test_wrong_pair_rejected() {
        let m = manager();
        m.sign_in("alice", "secret").await.unwrap();
        assert!(matches!(
            m.login("alice", "wrong").await,
            Err(AuthError::PairLoginPasswordNotExist)
        ));
        assert!(matches!(
            m.login("bob", "secret").await,
            Err(AuthError::PairLoginPasswordNotExist)
        ));
    }

    #[tokio::test]
    async fn test_empty_fields_rejected() {
        let m = manager();
        assert!(matches!(
            m.sign_in("", "secret").await,
            Err(AuthError::EmptyLoginOrPassword)
        ));
        assert!(matches!(
            m.login("alice", "").await,
            Err(AuthError::EmptyLoginOrPassword)
        ));
    }
}
