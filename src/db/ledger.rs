use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use uuid::Uuid;

use super::{PgStore, SafeRow, StorageError, number_from_db, number_to_db};
use crate::core_types::UserId;
use crate::ledger::models::{Balance, Withdrawal};
use crate::ledger::repository::{LedgerRepository, WithdrawOutcome};
use crate::money::Currency;

fn withdrawal_from_row(row: &PgRow) -> Result<Withdrawal, StorageError> {
    Ok(Withdrawal {
        id: row.get_required::<Uuid>("id")?,
        owner: UserId::from_uuid(row.get_required("user_id")?),
        order: number_from_db(row.get_required("number")?),
        sum: Currency::from_minor(row.get_required("sum")?),
        processed_at: row.get_required::<DateTime<Utc>>("processed_at")?,
    })
}

#[async_trait]
impl LedgerRepository for PgStore {
    async fn read_balance(&self, owner: UserId) -> Result<Balance, StorageError> {
        let row = sqlx::query("SELECT current, collected, withdrawn FROM users WHERE id = $1")
            .bind(owner.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(Balance::default());
        };
        Ok(Balance {
            current: Currency::from_minor(row.get_required("current")?),
            collected: Currency::from_minor(row.get_required("collected")?),
            withdrawn: Currency::from_minor(row.get_required("withdrawn")?),
        })
    }

    async fn create_withdrawal(
        &self,
        withdrawal: &Withdrawal,
    ) -> Result<WithdrawOutcome, StorageError> {
        let mut tx = self.pool.begin().await?;

        // Lock the owner row; concurrent withdrawals queue here.
        let current: Option<i64> =
            sqlx::query_scalar("SELECT current FROM users WHERE id = $1 FOR UPDATE")
                .bind(withdrawal.owner.as_uuid())
                .fetch_optional(&mut *tx)
                .await?;

        let current = Currency::from_minor(current.unwrap_or(0));
        if withdrawal.sum > current {
            tx.rollback().await?;
            return Ok(WithdrawOutcome::NotEnoughFund);
        }

        sqlx::query(
            "UPDATE users SET current = current - $2, withdrawn = withdrawn + $2 WHERE id = $1",
        )
        .bind(withdrawal.owner.as_uuid())
        .bind(withdrawal.sum.minor())
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO withdrawals (id, user_id, number, sum, processed_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(withdrawal.id)
        .bind(withdrawal.owner.as_uuid())
        .bind(number_to_db(withdrawal.order))
        .bind(withdrawal.sum.minor())
        .bind(withdrawal.processed_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(WithdrawOutcome::Recorded)
    }

    async fn list_withdrawals(&self, owner: UserId) -> Result<Vec<Withdrawal>, StorageError> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, number, sum, processed_at
            FROM withdrawals
            WHERE user_id = $1
            ORDER BY processed_at ASC
            "#,
        )
        .bind(owner.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(withdrawal_from_row).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::tests::{fresh_number, pg_store, register_pg_user};
    use crate::orders::models::{Order, OrderStatus, OrderUpdate};
    use crate::orders::repository::OrderRepository;

    #[tokio::test]
    #[ignore] // Requires PostgreSQL running
    async fn test_pg_withdrawal_checks_current_balance() {
        let store = pg_store().await;
        let alice = register_pg_user(&store).await;

        let number = fresh_number();
        store.create_order(&Order::new(alice, number)).await.unwrap();
        store
            .update_order(&OrderUpdate {
                number,
                status: OrderStatus::Processed,
                accrual: Some(Currency::from_minor(500)),
                processed_at: Utc::now(),
            })
            .await
            .unwrap();

        let w = Withdrawal::new(alice, fresh_number(), Currency::from_minor(501));
        assert_eq!(
            store.create_withdrawal(&w).await.unwrap(),
            WithdrawOutcome::NotEnoughFund
        );
        let w = Withdrawal::new(alice, fresh_number(), Currency::from_minor(300));
        assert_eq!(store.create_withdrawal(&w).await.unwrap(), WithdrawOutcome::Recorded);

        let balance = store.read_balance(alice).await.unwrap();
        assert_eq!(balance.current, Currency::from_minor(200));
        assert_eq!(balance.withdrawn, Currency::from_minor(300));
        assert_eq!(store.list_withdrawals(alice).await.unwrap().len(), 1);
    }
}
