use async_trait::async_trait;
use uuid::Uuid;

use super::{PgStore, StorageError};
use crate::core_types::UserId;
use crate::user_auth::repository::{CredentialRepository, SignUpOutcome};

#[async_trait]
impl CredentialRepository for PgStore {
    async fn create_user_with_credential(
        &self,
        user: UserId,
        login: &str,
        password_digest: &str,
    ) -> Result<SignUpOutcome, StorageError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("INSERT INTO users (id) VALUES ($1)")
            .bind(user.as_uuid())
            .execute(&mut *tx)
            .await?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO credentials (login, password, user_id)
            VALUES ($1, $2, $3)
            ON CONFLICT (login) DO NOTHING
            "#,
        )
        .bind(login)
        .bind(password_digest)
        .bind(user.as_uuid())
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if inserted == 0 {
            tx.rollback().await?;
            return Ok(SignUpOutcome::LoginTaken);
        }

        tx.commit().await?;
        Ok(SignUpOutcome::Created)
    }

    async fn read_credential_by_login(&self, login: &str) -> Result<Option<UserId>, StorageError> {
        let id: Option<Uuid> = sqlx::query_scalar("SELECT user_id FROM credentials WHERE login = $1")
            .bind(login)
            .fetch_optional(&self.pool)
            .await?;
        Ok(id.map(UserId::from_uuid))
    }

    async fn read_credential_by_login_and_password(
        &self,
        login: &str,
        password_digest: &str,
    ) -> Result<Option<UserId>, StorageError> {
        let id: Option<Uuid> = sqlx::query_scalar(
            "SELECT user_id FROM credentials WHERE login = $1 AND password = $2",
        )
        .bind(login)
        .bind(password_digest)
        .fetch_optional(&self.pool)
        .await?;
        Ok(id.map(UserId::from_uuid))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::tests::{pg_store, register_pg_user};

    #[tokio::test]
    #[ignore] // Requires PostgreSQL running
    async fn test_pg_credentials_round_trip() {
        let store = pg_store().await;
        let user = register_pg_user(&store).await;
        let login = format!("it-{}", user);

        assert_eq!(store.read_credential_by_login(&login).await.unwrap(), Some(user));
        assert_eq!(
            store
                .read_credential_by_login_and_password(&login, "digest")
                .await
                .unwrap(),
            Some(user)
        );
        assert_eq!(
            store
                .read_credential_by_login_and_password(&login, "other")
                .await
                .unwrap(),
            None
        );
        assert_eq!(
            store
                .create_user_with_credential(UserId::new(), &login, "x")
                .await
                .unwrap(),
            SignUpOutcome::LoginTaken
        );
    }
}
