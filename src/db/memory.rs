//! In-process store implementing every repository trait.
//!
//! All state sits behind one async mutex, so each repository call is a
//! single atomic unit, mirroring the transactions of the PostgreSQL store.
//! Used by tests and by database-less runs.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::StorageError;
use crate::core_types::UserId;
use crate::ledger::models::{Balance, Withdrawal};
use crate::ledger::repository::{LedgerRepository, WithdrawOutcome};
#[cfg(test)]
use crate::money::Currency;
use crate::orders::models::{Order, OrderStatus, OrderUpdate};
use crate::orders::repository::{CreateOutcome, OrderRepository, UpdateOutcome};
use crate::user_auth::repository::{CredentialRepository, SignUpOutcome};

#[derive(Default)]
struct MemoryState {
    balances: HashMap<UserId, Balance>,
    /// login -> (user, password digest)
    credentials: HashMap<String, (UserId, String)>,
    /// Upload order
    orders: Vec<Order>,
    /// order number -> index into `orders`
    order_index: HashMap<u64, usize>,
    withdrawals: Vec<Withdrawal>,
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub(crate) async fn credit_for_test(&self, owner: UserId, amount: Currency) {
        let mut state = self.state.lock().await;
        let balance = state.balances.entry(owner).or_default();
        balance.credit(amount).expect("credit overflow");
    }
}

#[async_trait]
impl OrderRepository for MemoryStore {
    async fn create_order(&self, order: &Order) -> Result<CreateOutcome, StorageError> {
        let mut state = self.state.lock().await;
        if let Some(&idx) = state.order_index.get(&order.number.value()) {
            return Ok(if state.orders[idx].owner == order.owner {
                CreateOutcome::AlreadyUploaded
            } else {
                CreateOutcome::OwnedByAnotherUser
            });
        }
        let idx = state.orders.len();
        state.orders.push(order.clone());
        state.order_index.insert(order.number.value(), idx);
        Ok(CreateOutcome::Created)
    }

    async fn list_orders_by_user(&self, owner: UserId) -> Result<Vec<Order>, StorageError> {
        let state = self.state.lock().await;
        let mut orders: Vec<Order> = state
            .orders
            .iter()
            .filter(|o| o.owner == owner)
            .cloned()
            .collect();
        orders.sort_by_key(|o| o.uploaded_at);
        Ok(orders)
    }

    async fn list_unprocessed_orders(&self) -> Result<Vec<Order>, StorageError> {
        let state = self.state.lock().await;
        Ok(state
            .orders
            .iter()
            .filter(|o| !o.status.is_terminal())
            .cloned()
            .collect())
    }

    async fn update_order(&self, update: &OrderUpdate) -> Result<UpdateOutcome, StorageError> {
        let mut state = self.state.lock().await;
        let Some(&idx) = state.order_index.get(&update.number.value()) else {
            return Ok(UpdateOutcome::Skipped);
        };

        let current = &state.orders[idx];
        if !current.status.can_transition_to(update.status) {
            return Ok(UpdateOutcome::Skipped);
        }
        let owner = current.owner;

        let credited = match update.status {
            OrderStatus::Processed => Some(update.accrual.unwrap_or_default()),
            _ => None,
        };
        if let Some(amount) = credited {
            let mut balance = state.balances.get(&owner).copied().unwrap_or_default();
            balance
                .credit(amount)
                .ok_or_else(|| StorageError::Corrupted(format!("balance overflow for {owner}")))?;
            state.balances.insert(owner, balance);
        }

        let order = &mut state.orders[idx];
        order.status = update.status;
        order.accrual = credited;
        order.processed_at = Some(update.processed_at);
        Ok(UpdateOutcome::Applied { credited })
    }
}

#[async_trait]
impl LedgerRepository for MemoryStore {
    async fn read_balance(&self, owner: UserId) -> Result<Balance, StorageError> {
        let state = self.state.lock().await;
        Ok(state.balances.get(&owner).copied().unwrap_or_default())
    }

    async fn create_withdrawal(
        &self,
        withdrawal: &Withdrawal,
    ) -> Result<WithdrawOutcome, StorageError> {
        let mut state = self.state.lock().await;
        let balance = state.balances.entry(withdrawal.owner).or_default();
        if balance.debit(withdrawal.sum).is_none() {
            return Ok(WithdrawOutcome::NotEnoughFund);
        }
        state.withdrawals.push(withdrawal.clone());
        Ok(WithdrawOutcome::Recorded)
    }

    async fn list_withdrawals(&self, owner: UserId) -> Result<Vec<Withdrawal>, StorageError> {
        let state = self.state.lock().await;
        Ok(state
            .withdrawals
            .iter()
            .filter(|w| w.owner == owner)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl CredentialRepository for MemoryStore {
    async fn create_user_with_credential(
        &self,
        user: UserId,
        login: &str,
        password_digest: &str,
    ) -> Result<SignUpOutcome, StorageError> {
        let mut state = self.state.lock().await;
        if state.credentials.contains_key(login) {
            return Ok(SignUpOutcome::LoginTaken);
        }
        state
            .credentials
            .insert(login.to_string(), (user, password_digest.to_string()));
        state.balances.insert(user, Balance::default());
        Ok(SignUpOutcome::Created)
    }

    async fn read_credential_by_login(&self, login: &str) -> Result<Option<UserId>, StorageError> {
        let state = self.state.lock().await;
        Ok(state.credentials.get(login).map(|(user, _)| *user))
    }

    async fn read_credential_by_login_and_password(
        &self,
        login: &str,
        password_digest: &str,
    ) -> Result<Option<UserId>, StorageError> {
        let state = self.state.lock().await;
        Ok(state
            .credentials
            .get(login)
            .filter(|(_, digest)| digest == password_digest)
            .map(|(user, _)| *user))
    }
}
