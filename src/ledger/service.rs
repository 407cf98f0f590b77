use std::sync::Arc;

use tracing::{info, warn};

use super::error::LedgerError;
use super::models::{Balance, Withdrawal};
use super::repository::{LedgerRepository, WithdrawOutcome};
use crate::core_types::UserId;
use crate::money::Currency;
use crate::order_number::OrderNumber;

/// Balance queries and withdrawals
pub struct LedgerService {
    repo: Arc<dyn LedgerRepository>,
}

impl LedgerService {
    pub fn new(repo: Arc<dyn LedgerRepository>) -> Self {
        Self { repo }
    }

    pub async fn get(&self, owner: UserId) -> Result<Balance, LedgerError> {
        Ok(self.repo.read_balance(owner).await?)
    }

    /// Spend `sum` points against a new order.
    ///
    /// Validation happens before anything reaches storage; the funds check
    /// and the debit are one atomic unit inside the repository.
    pub async fn withdraw(
        &self,
        owner: UserId,
        order_text: &str,
        sum: Currency,
    ) -> Result<Withdrawal, LedgerError> {
        let order = OrderNumber::parse(order_text)?;
        if !sum.is_positive() {
            return Err(LedgerError::InvalidAmount);
        }

        let withdrawal = Withdrawal::new(owner, order, sum);
        match self.repo.create_withdrawal(&withdrawal).await? {
            WithdrawOutcome::Recorded => {
                info!(user_id = %owner, order = %order, sum = %sum, "withdrawal recorded");
                Ok(withdrawal)
            }
            WithdrawOutcome::NotEnoughFund => {
                warn!(user_id = %owner, order = %order, sum = %sum, "withdrawal rejected: not enough funds");
                Err(LedgerError::NotEnoughFund)
            }
        }
    }

    pub async fn list(&self, owner: UserId) -> Result<Vec<Withdrawal>, LedgerError> {
        Ok(self.repo.list_withdrawals(owner).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;

    async fn funded(minor: i64) -> (Arc<MemoryStore>, LedgerService, UserId) {
        let store = Arc::new(MemoryStore::new());
        let user = UserId::new();
        store.credit_for_test(user, Currency::from_minor(minor)).await;
        let svc = LedgerService::new(store.clone());
        (store, svc, user)
    }

    #[tokio::test]
    async fn test_empty_balance() {
        let svc = LedgerService::new(Arc::new(MemoryStore::new()));
        let user = UserId::new();
        assert_eq!(svc.get(user).await.unwrap(), Balance::default());
        assert!(svc.list(user).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_withdraw_moves_funds() {
        let (_, svc, user) = funded(500).await;
        svc.withdraw(user, "2377225624", Currency::from_minor(300))
            .await
            .unwrap();

        let b = svc.get(user).await.unwrap();
        assert_eq!(b.current, Currency::from_minor(200));
        assert_eq!(b.withdrawn, Currency::from_minor(300));

        let history = svc.list(user).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].order.value(), 2377225624);
        assert_eq!(history[0].sum, Currency::from_minor(300));
    }

    #[tokio::test]
    async fn test_overdraft_rejected_without_side_effects() {
        let (_, svc, user) = funded(500).await;
        let err = svc
            .withdraw(user, "2377225624", Currency::from_minor(501))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::NotEnoughFund));
        assert_eq!(err.http_status(), axum::http::StatusCode::PAYMENT_REQUIRED);

        let b = svc.get(user).await.unwrap();
        assert_eq!(b.current, Currency::from_minor(500));
        assert_eq!(b.withdrawn, Currency::ZERO);
        assert!(svc.list(user).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_validation_errors() {
        let (_, svc, user) = funded(500).await;
        assert!(matches!(
            svc.withdraw(user, "181", Currency::from_minor(1)).await,
            Err(LedgerError::InvalidNumberFormat(_))
        ));
        assert!(matches!(
            svc.withdraw(user, "18", Currency::ZERO).await,
            Err(LedgerError::InvalidAmount)
        ));
        assert!(matches!(
            svc.withdraw(user, "18", Currency::from_minor(-100)).await,
            Err(LedgerError::InvalidAmount)
        ));
        assert_eq!(svc.get(user).await.unwrap().current, Currency::from_minor(500));
    }

    #[tokio::test]
    async fn test_concurrent_withdrawals_never_overdraw() {
        let (_, svc, user) = funded(1_000).await;
        let svc = Arc::new(svc);

        let mut handles = Vec::new();
        for _ in 0..10 {
            let svc = svc.clone();
            handles.push(tokio::spawn(async move {
                svc.withdraw(user, "18", Currency::from_minor(300)).await
            }));
        }
        let results = futures::future::join_all(handles).await;
        let ok = results
            .into_iter()
            .filter(|r| matches!(r, Ok(Ok(_))))
            .count();

        assert_eq!(ok, 3);
        let b = svc.get(user).await.unwrap();
        assert_eq!(b.current, Currency::from_minor(100));
        assert_eq!(b.withdrawn, Currency::from_minor(900));
    }
}
