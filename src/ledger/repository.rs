use async_trait::async_trait;

use super::models::{Balance, Withdrawal};
use crate::core_types::UserId;
use crate::db::StorageError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WithdrawOutcome {
    Recorded,
    /// Nothing was written
    NotEnoughFund,
}

/// Balance and withdrawal persistence
#[async_trait]
pub trait LedgerRepository: Send + Sync {
    /// Zero balance for a user with no history
    async fn read_balance(&self, owner: UserId) -> Result<Balance, StorageError>;

    /// Check funds and record the withdrawal in one atomic unit,
    /// serialized per owner.
    async fn create_withdrawal(
        &self,
        withdrawal: &Withdrawal,
    ) -> Result<WithdrawOutcome, StorageError>;

    /// Owner's withdrawals, oldest first
    async fn list_withdrawals(&self, owner: UserId) -> Result<Vec<Withdrawal>, StorageError>;
}
