use std::sync::Arc;

use tracing::info;

use super::error::OrderError;
use super::models::Order;
use super::repository::{CreateOutcome, OrderRepository};
use crate::core_types::UserId;
use crate::order_number::OrderNumber;

/// Result of a successful upload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadOutcome {
    /// New order stored, accrual pending
    Accepted,
    /// Caller had uploaded this number before
    AlreadyUploaded,
}

/// Order upload and listing
pub struct OrderService {
    repo: Arc<dyn OrderRepository>,
}

impl OrderService {
    pub fn new(repo: Arc<dyn OrderRepository>) -> Self {
        Self { repo }
    }

    /// Register an order number for `owner`.
    ///
    /// The first owner to store a number keeps it; a repeat upload by the
    /// same owner is idempotent.
    pub async fn add(&self, owner: UserId, number_text: &str) -> Result<UploadOutcome, OrderError> {
        let number = OrderNumber::parse(number_text)?;
        let order = Order::new(owner, number);
        match self.repo.create_order(&order).await? {
            CreateOutcome::Created => {
                info!(user_id = %owner, order = %number, "order uploaded");
                Ok(UploadOutcome::Accepted)
            }
            CreateOutcome::AlreadyUploaded => Ok(UploadOutcome::AlreadyUploaded),
            CreateOutcome::OwnedByAnotherUser => Err(OrderError::AlreadyUploadedByAnotherUser),
        }
    }

    pub async fn list(&self, owner: UserId) -> Result<Vec<Order>, OrderError> {
        Ok(self.repo.list_orders_by_user(owner).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::order_number::OrderNumberError;
    use crate::orders::models::OrderStatus;

    fn service() -> OrderService {
        OrderService::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn test_add_and_list() {
        let svc = service();
        let user = UserId::new();
        assert_eq!(svc.add(user, "12345678903").await.unwrap(), UploadOutcome::Accepted);
        assert_eq!(svc.add(user, "346436439").await.unwrap(), UploadOutcome::Accepted);

        let orders = svc.list(user).await.unwrap();
        assert_eq!(orders.len(), 2);
        assert_eq!(orders[0].number.value(), 12345678903);
        assert_eq!(orders[1].number.value(), 346436439);
        assert!(orders.iter().all(|o| o.status == OrderStatus::New));
        assert!(orders[0].uploaded_at <= orders[1].uploaded_at);
    }

    #[tokio::test]
    async fn test_repeat_upload_is_idempotent() {
        let svc = service();
        let user = UserId::new();
        svc.add(user, "18").await.unwrap();
        assert_eq!(svc.add(user, "18").await.unwrap(), UploadOutcome::AlreadyUploaded);
        assert_eq!(svc.list(user).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_other_user_conflict_keeps_original_owner() {
        let svc = service();
        let alice = UserId::new();
        let bob = UserId::new();
        svc.add(alice, "18").await.unwrap();

        let err = svc.add(bob, "18").await.unwrap_err();
        assert!(matches!(err, OrderError::AlreadyUploadedByAnotherUser));
        assert_eq!(err.http_status(), axum::http::StatusCode::CONFLICT);

        let alice_orders = svc.list(alice).await.unwrap();
        assert_eq!(alice_orders.len(), 1);
        assert_eq!(alice_orders[0].owner, alice);
        assert!(svc.list(bob).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_numbers_rejected() {
        let svc = service();
        let user = UserId::new();
        for bad in ["181", "abc", "", "+18"] {
            let err = svc.add(user, bad).await.unwrap_err();
            assert!(matches!(err, OrderError::InvalidNumberFormat(_)), "{bad}");
        }
        assert!(matches!(
            svc.add(user, "10").await,
            Err(OrderError::InvalidNumberFormat(OrderNumberError::Checksum))
        ));
        assert!(svc.list(user).await.unwrap().is_empty());
    }
}
