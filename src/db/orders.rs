use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use uuid::Uuid;

use super::{PgStore, SafeRow, StorageError, number_from_db, number_to_db};
use crate::core_types::UserId;
use crate::money::Currency;
use crate::orders::models::{Order, OrderStatus, OrderUpdate};
use crate::orders::repository::{CreateOutcome, OrderRepository, UpdateOutcome};

const ORDER_COLUMNS: &str = "id, user_id, number, status, accrual, uploaded_at, processed_at";

fn order_from_row(row: &PgRow) -> Result<Order, StorageError> {
    let status: String = row.get_required("status")?;
    let status = status.parse::<OrderStatus>().map_err(StorageError::Corrupted)?;
    let accrual: Option<i64> = row.get_required("accrual")?;
    Ok(Order {
        id: row.get_required::<Uuid>("id")?,
        owner: UserId::from_uuid(row.get_required("user_id")?),
        number: number_from_db(row.get_required("number")?),
        status,
        accrual: accrual.map(Currency::from_minor),
        uploaded_at: row.get_required::<DateTime<Utc>>("uploaded_at")?,
        processed_at: row.get_required::<Option<DateTime<Utc>>>("processed_at")?,
    })
}

#[async_trait]
impl OrderRepository for PgStore {
    async fn create_order(&self, order: &Order) -> Result<CreateOutcome, StorageError> {
        let inserted = sqlx::query(
            r#"
            INSERT INTO orders (id, user_id, number, status, uploaded_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (number) DO NOTHING
            "#,
        )
        .bind(order.id)
        .bind(order.owner.as_uuid())
        .bind(number_to_db(order.number))
        .bind(order.status.as_str())
        .bind(order.uploaded_at)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if inserted == 1 {
            return Ok(CreateOutcome::Created);
        }

        let existing_owner: Option<Uuid> =
            sqlx::query_scalar("SELECT user_id FROM orders WHERE number = $1")
                .bind(number_to_db(order.number))
                .fetch_optional(&self.pool)
                .await?;

        match existing_owner {
            Some(owner) if owner == order.owner.as_uuid() => Ok(CreateOutcome::AlreadyUploaded),
            Some(_) => Ok(CreateOutcome::OwnedByAnotherUser),
            None => Err(StorageError::Corrupted(format!(
                "order {} conflicted but is not stored",
                order.number
            ))),
        }
    }

    async fn list_orders_by_user(&self, owner: UserId) -> Result<Vec<Order>, StorageError> {
        let rows = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY uploaded_at ASC"
        ))
        .bind(owner.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(order_from_row).collect()
    }

    async fn list_unprocessed_orders(&self) -> Result<Vec<Order>, StorageError> {
        let rows = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE status IN ('NEW', 'PROCESSING') ORDER BY uploaded_at ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(order_from_row).collect()
    }

    async fn update_order(&self, update: &OrderUpdate) -> Result<UpdateOutcome, StorageError> {
        let allowed: Vec<&str> = update
            .status
            .allowed_predecessors()
            .iter()
            .map(|s| s.as_str())
            .collect();
        let accrual = match update.status {
            OrderStatus::Processed => Some(update.accrual.unwrap_or_default()),
            _ => None,
        };

        let mut tx = self.pool.begin().await?;

        // The status guard makes a replayed or stale update match no row.
        let owner: Option<Uuid> = sqlx::query_scalar(
            r#"
            UPDATE orders
            SET status = $2, accrual = $3, processed_at = $4
            WHERE number = $1 AND status = ANY($5)
            RETURNING user_id
            "#,
        )
        .bind(number_to_db(update.number))
        .bind(update.status.as_str())
        .bind(accrual.map(Currency::minor))
        .bind(update.processed_at)
        .bind(&allowed)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(owner) = owner else {
            tx.rollback().await?;
            return Ok(UpdateOutcome::Skipped);
        };

        if let Some(amount) = accrual {
            sqlx::query(
                "UPDATE users SET current = current + $2, collected = collected + $2 WHERE id = $1",
            )
            .bind(owner)
            .bind(amount.minor())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(UpdateOutcome::Applied { credited: accrual })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::tests::{fresh_number, pg_store, register_pg_user};
    use crate::ledger::repository::LedgerRepository;

    #[tokio::test]
    #[ignore] // Requires PostgreSQL running
    async fn test_pg_order_ownership_and_single_credit() {
        let store = pg_store().await;
        let alice = register_pg_user(&store).await;
        let bob = register_pg_user(&store).await;
        let number = fresh_number();

        assert_eq!(
            store.create_order(&Order::new(alice, number)).await.unwrap(),
            CreateOutcome::Created
        );
        assert_eq!(
            store.create_order(&Order::new(alice, number)).await.unwrap(),
            CreateOutcome::AlreadyUploaded
        );
        assert_eq!(
            store.create_order(&Order::new(bob, number)).await.unwrap(),
            CreateOutcome::OwnedByAnotherUser
        );

        let update = OrderUpdate {
            number,
            status: OrderStatus::Processed,
            accrual: Some(Currency::from_minor(500)),
            processed_at: Utc::now(),
        };
        assert!(matches!(
            store.update_order(&update).await.unwrap(),
            UpdateOutcome::Applied { .. }
        ));
        assert_eq!(store.update_order(&update).await.unwrap(), UpdateOutcome::Skipped);

        let balance = store.read_balance(alice).await.unwrap();
        assert_eq!(balance.current, Currency::from_minor(500));
        assert_eq!(balance.collected, Currency::from_minor(500));

        let orders = store.list_orders_by_user(alice).await.unwrap();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].status, OrderStatus::Processed);
        assert_eq!(orders[0].accrual, Some(Currency::from_minor(500)));
    }
}
