//! Accrual service client
//!
//! The external accrual service computes the points earned by an order.
//! It is polled with `GET {base}/api/orders/{number}`. Only HTTP 429 is
//! retried; every other failure is reported to the reconciliation loop,
//! which tries again on the next tick.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::RETRY_AFTER;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use super::models::OrderStatus;
use crate::money::Currency;
use crate::order_number::OrderNumber;

/// Upper bound on a server-requested `Retry-After` wait
const MAX_RETRY_AFTER: Duration = Duration::from_secs(10);

/// Largest accrual accepted for one order (one billion points)
pub const MAX_ACCRUAL: Currency =
    Currency::from_minor(1_000_000_000 * crate::money::MINOR_PER_MAJOR);

#[derive(Error, Debug)]
pub enum AccrualError {
    #[error("Accrual request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Order {0} is not registered in the accrual service")]
    NotRegistered(OrderNumber),

    #[error("Accrual service still rate limiting after {attempts} attempts")]
    RateLimited { attempts: u32 },

    #[error("Unexpected accrual response status: {0}")]
    UnexpectedStatus(u16),

    #[error("Malformed accrual response: {0}")]
    MalformedResponse(String),
}

/// Status reported by the accrual service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccrualStatus {
    Registered,
    Processing,
    Invalid,
    Processed,
}

impl From<AccrualStatus> for OrderStatus {
    fn from(status: AccrualStatus) -> Self {
        match status {
            AccrualStatus::Registered => OrderStatus::New,
            AccrualStatus::Processing => OrderStatus::Processing,
            AccrualStatus::Invalid => OrderStatus::Invalid,
            AccrualStatus::Processed => OrderStatus::Processed,
        }
    }
}

/// Raw accrual service response body
#[derive(Debug, Clone, Deserialize)]
pub struct AccrualResponse {
    #[serde(default)]
    pub order: Option<String>,
    pub status: AccrualStatus,
    #[serde(default)]
    pub accrual: Option<Currency>,
}

/// Validated poll result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccrualResult {
    pub status: OrderStatus,
    /// Carried only for `Processed`
    pub accrual: Option<Currency>,
}

impl AccrualResponse {
    pub fn into_result(self) -> Result<AccrualResult, AccrualError> {
        match self.order.as_deref() {
            None | Some("") => {
                return Err(AccrualError::MalformedResponse(
                    "missing order field".to_string(),
                ));
            }
            Some(_) => {}
        }
        let accrual = match self.status {
            AccrualStatus::Processed => Some(self.accrual.unwrap_or_default()),
            _ => None,
        };
        if let Some(amount) = accrual.filter(|a| *a < Currency::ZERO || *a > MAX_ACCRUAL) {
            return Err(AccrualError::MalformedResponse(format!(
                "accrual {} out of range",
                amount
            )));
        }
        Ok(AccrualResult {
            status: self.status.into(),
            accrual,
        })
    }
}

/// Source of accrual decisions for the reconciliation loop
#[async_trait]
pub trait AccrualClient: Send + Sync {
    async fn fetch(&self, number: OrderNumber) -> Result<AccrualResult, AccrualError>;
}

/// Client settings
#[derive(Debug, Clone)]
pub struct AccrualClientConfig {
    pub base_url: String,
    pub request_timeout: Duration,
    /// Retries after the first attempt, 429 only
    pub retry_count: u32,
    pub retry_wait: Duration,
}

/// reqwest-backed accrual client
pub struct HttpAccrualClient {
    http: reqwest::Client,
    base_url: String,
    retry_count: u32,
    retry_wait: Duration,
}

impl HttpAccrualClient {
    pub fn new(config: AccrualClientConfig) -> Result<Self, AccrualError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self {
            http,
            base_url: normalize_base_url(&config.base_url),
            retry_count: config.retry_count,
            retry_wait: config.retry_wait,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn order_url(&self, number: OrderNumber) -> String {
        format!("{}/api/orders/{}", self.base_url, number)
    }
}

/// Accept both `host:port` and full URLs; strip trailing slashes.
fn normalize_base_url(address: &str) -> String {
    let address = address.trim().trim_end_matches('/');
    if address.starts_with("http://") || address.starts_with("https://") {
        address.to_string()
    } else {
        format!("http://{address}")
    }
}

fn retry_after(response: &reqwest::Response) -> Option<Duration> {
    response
        .headers()
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(|secs| Duration::from_secs(secs).min(MAX_RETRY_AFTER))
}

#[async_trait]
impl AccrualClient for HttpAccrualClient {
    async fn fetch(&self, number: OrderNumber) -> Result<AccrualResult, AccrualError> {
        let url = self.order_url(number);
        let mut attempt = 0;
        loop {
            attempt += 1;
            let response = self.http.get(&url).send().await?;
            match response.status() {
                StatusCode::OK => {
                    let body: AccrualResponse = response
                        .json()
                        .await
                        .map_err(|e| AccrualError::MalformedResponse(e.to_string()))?;
                    debug!(order = %number, status = ?body.status, "accrual response");
                    return body.into_result();
                }
                StatusCode::NO_CONTENT => return Err(AccrualError::NotRegistered(number)),
                StatusCode::TOO_MANY_REQUESTS => {
                    if attempt > self.retry_count {
                        return Err(AccrualError::RateLimited { attempts: attempt });
                    }
                    let wait = retry_after(&response).unwrap_or(self.retry_wait);
                    warn!(order = %number, attempt, ?wait, "accrual service rate limited");
                    tokio::time::sleep(wait).await;
                }
                other => return Err(AccrualError::UnexpectedStatus(other.as_u16())),
            }
        }
    }
}
