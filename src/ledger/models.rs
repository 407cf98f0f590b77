use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::core_types::UserId;
use crate::money::Currency;
use crate::order_number::OrderNumber;

/// Per-user totals; `current = collected - withdrawn` and never negative.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Balance {
    pub current: Currency,
    pub collected: Currency,
    pub withdrawn: Currency,
}

impl Balance {
    /// Credit an accrual to both current and collected
    pub fn credit(&mut self, amount: Currency) -> Option<()> {
        self.current = self.current.checked_add(amount)?;
        self.collected = self.collected.checked_add(amount)?;
        Some(())
    }

    /// Move `sum` from current to withdrawn; `None` when funds are short.
    pub fn debit(&mut self, sum: Currency) -> Option<()> {
        if sum > self.current {
            return None;
        }
        self.current = self.current.checked_sub(sum)?;
        self.withdrawn = self.withdrawn.checked_add(sum)?;
        Some(())
    }
}

/// `GET /api/user/balance` body
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BalanceView {
    #[schema(value_type = f64, example = 500.5)]
    pub current: Currency,
    #[serde(default, skip_serializing_if = "is_zero")]
    #[schema(value_type = Option<f64>, example = 42)]
    pub withdrawn: Currency,
}

fn is_zero(c: &Currency) -> bool {
    *c == Currency::ZERO
}

impl From<Balance> for BalanceView {
    fn from(b: Balance) -> Self {
        Self {
            current: b.current,
            withdrawn: b.withdrawn,
        }
    }
}

/// Recorded withdrawal, immutable once stored
#[derive(Debug, Clone, PartialEq)]
pub struct Withdrawal {
    pub id: Uuid,
    pub owner: UserId,
    pub order: OrderNumber,
    pub sum: Currency,
    pub processed_at: DateTime<Utc>,
}

impl Withdrawal {
    pub fn new(owner: UserId, order: OrderNumber, sum: Currency) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner,
            order,
            sum,
            processed_at: Utc::now(),
        }
    }
}

/// Withdrawal history entry
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WithdrawalView {
    #[schema(value_type = String, example = "2377225624")]
    pub order: OrderNumber,
    #[schema(value_type = f64, example = 500)]
    pub sum: Currency,
    #[schema(example = "2020-12-09T16:09:57+03:00")]
    pub processed_at: String,
}

impl From<&Withdrawal> for WithdrawalView {
    fn from(w: &Withdrawal) -> Self {
        Self {
            order: w.order,
            sum: w.sum,
            processed_at: w.processed_at.to_rfc3339_opts(SecondsFormat::Secs, false),
        }
    }
}

/// `POST /api/user/balance/withdraw` body
///
/// `order` stays raw text here so a bad checksum maps to 422, not to a
/// JSON rejection.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct WithdrawRequest {
    #[schema(example = "2377225624")]
    pub order: String,
    #[schema(value_type = f64, example = 751)]
    pub sum: Currency,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debit_respects_current() {
        let mut b = Balance::default();
        b.credit(Currency::from_minor(500)).unwrap();
        assert!(b.debit(Currency::from_minor(501)).is_none());
        assert_eq!(b.current, Currency::from_minor(500));

        b.debit(Currency::from_minor(300)).unwrap();
        assert_eq!(b.current, Currency::from_minor(200));
        assert_eq!(b.withdrawn, Currency::from_minor(300));
        assert_eq!(b.collected, Currency::from_minor(500));
    }

    #[test]
    fn test_balance_view_omits_zero_withdrawn() {
        let view = BalanceView::from(Balance {
            current: Currency::from_minor(500),
            ..Balance::default()
        });
        assert_eq!(serde_json::to_string(&view).unwrap(), r#"{"current":5}"#);

        let view = BalanceView::from(Balance {
            current: Currency::from_minor(250),
            collected: Currency::from_minor(550),
            withdrawn: Currency::from_minor(300),
        });
        assert_eq!(
            serde_json::to_string(&view).unwrap(),
            r#"{"current":2.5,"withdrawn":3}"#
        );
    }

    #[test]
    fn test_withdraw_request_parses_numbers() {
        let req: WithdrawRequest =
            serde_json::from_str(r#"{"order":"2377225624","sum":751}"#).unwrap();
        assert_eq!(req.order, "2377225624");
        assert_eq!(req.sum, Currency::from_minor(75_100));
    }
}
