//! Order entity and its status state machine

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::core_types::UserId;
use crate::money::Currency;
use crate::order_number::OrderNumber;

/// Order status
///
/// Only advances `New -> Processing -> {Invalid, Processed}`; the two
/// terminal states are final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    New,
    Processing,
    Invalid,
    Processed,
}

impl OrderStatus {
    pub const NON_TERMINAL: [OrderStatus; 2] = [OrderStatus::New, OrderStatus::Processing];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::New => "NEW",
            OrderStatus::Processing => "PROCESSING",
            OrderStatus::Invalid => "INVALID",
            OrderStatus::Processed => "PROCESSED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Invalid | OrderStatus::Processed)
    }

    /// States an order may be in for a write of `self` to apply.
    ///
    /// `New` is only ever re-written onto `New` so a late REGISTERED
    /// answer cannot pull a `Processing` order backwards.
    pub fn allowed_predecessors(&self) -> &'static [OrderStatus] {
        match self {
            OrderStatus::New => &[OrderStatus::New],
            OrderStatus::Processing
            | OrderStatus::Invalid
            | OrderStatus::Processed => &Self::NON_TERMINAL,
        }
    }

    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        next.allowed_predecessors().contains(self)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NEW" => Ok(OrderStatus::New),
            "PROCESSING" => Ok(OrderStatus::Processing),
            "INVALID" => Ok(OrderStatus::Invalid),
            "PROCESSED" => Ok(OrderStatus::Processed),
            other => Err(format!("unknown order status: {other}")),
        }
    }
}

/// Stored order
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub id: Uuid,
    pub owner: UserId,
    pub number: OrderNumber,
    pub status: OrderStatus,
    /// Present only once the order is `Processed`
    pub accrual: Option<Currency>,
    pub uploaded_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Fresh upload in state `New`
    pub fn new(owner: UserId, number: OrderNumber) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner,
            number,
            status: OrderStatus::New,
            accrual: None,
            uploaded_at: Utc::now(),
            processed_at: None,
        }
    }
}

/// Result of one accrual poll, applied by `OrderRepository::update_order`.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderUpdate {
    pub number: OrderNumber,
    pub status: OrderStatus,
    pub accrual: Option<Currency>,
    pub processed_at: DateTime<Utc>,
}

/// Order as returned by `GET /api/user/orders`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderView {
    #[schema(value_type = String, example = "12345678903")]
    pub number: OrderNumber,
    #[schema(example = "PROCESSED")]
    pub status: OrderStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<f64>, example = 500)]
    pub accrual: Option<Currency>,
    #[schema(example = "2020-12-10T15:15:45+03:00")]
    pub uploaded_at: String,
}

impl From<&Order> for OrderView {
    fn from(order: &Order) -> Self {
        Self {
            number: order.number,
            status: order.status,
            accrual: order.accrual,
            uploaded_at: order.uploaded_at.to_rfc3339_opts(SecondsFormat::Secs, false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_transitions() {
        use OrderStatus::*;
        assert!(New.can_transition_to(New));
        assert!(New.can_transition_to(Processing));
        assert!(New.can_transition_to(Invalid));
        assert!(New.can_transition_to(Processed));
        assert!(Processing.can_transition_to(Processing));
        assert!(Processing.can_transition_to(Processed));
        assert!(Processing.can_transition_to(Invalid));

        assert!(!Processing.can_transition_to(New));
        for terminal in [Invalid, Processed] {
            for next in [New, Processing, Invalid, Processed] {
                assert!(!terminal.can_transition_to(next), "{terminal} -> {next}");
            }
        }
    }

    #[test]
    fn test_status_string_forms() {
        for status in [
            OrderStatus::New,
            OrderStatus::Processing,
            OrderStatus::Invalid,
            OrderStatus::Processed,
        ] {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
            assert_eq!(
                serde_json::to_string(&status).unwrap(),
                format!("\"{}\"", status.as_str())
            );
        }
        assert!("REGISTERED".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_order_view_wire_format() {
        let mut order = Order::new(UserId::new(), OrderNumber::parse("12345678903").unwrap());
        let json = serde_json::to_value(OrderView::from(&order)).unwrap();
        assert_eq!(json["number"], "12345678903");
        assert_eq!(json["status"], "NEW");
        assert!(json.get("accrual").is_none());
        assert!(DateTime::parse_from_rfc3339(json["uploaded_at"].as_str().unwrap()).is_ok());

        order.status = OrderStatus::Processed;
        order.accrual = Some(Currency::from_minor(50_000));
        let json = serde_json::to_value(OrderView::from(&order)).unwrap();
        assert_eq!(json["accrual"], 500);
    }
}
