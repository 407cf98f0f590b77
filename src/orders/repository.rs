use async_trait::async_trait;

use super::models::{Order, OrderUpdate};
use crate::core_types::UserId;
use crate::db::StorageError;
use crate::money::Currency;

/// Outcome of inserting a freshly uploaded order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    Created,
    /// Same number already stored for the same owner
    AlreadyUploaded,
    /// Same number already stored for someone else
    OwnedByAnotherUser,
}

/// Outcome of applying an accrual poll result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// Status written; `credited` is the amount added to the owner balance
    Applied { credited: Option<Currency> },
    /// Order already moved past the state this update may overwrite
    Skipped,
}

/// Order persistence
///
/// `update_order` is the only cross-row operation: on `Processed` it
/// credits the owner's balance in the same transaction, and it never
/// touches an order in a terminal state, so replaying an update is a no-op.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn create_order(&self, order: &Order) -> Result<CreateOutcome, StorageError>;

    /// Owner's orders, oldest upload first
    async fn list_orders_by_user(&self, owner: UserId) -> Result<Vec<Order>, StorageError>;

    /// Orders in `New` or `Processing`
    async fn list_unprocessed_orders(&self) -> Result<Vec<Order>, StorageError>;

    async fn update_order(&self, update: &OrderUpdate) -> Result<UpdateOutcome, StorageError>;
}
