//! Accrual reconciliation worker
//!
//! One background task. Every tick it loads the non-terminal orders, polls
//! the accrual service for each of them with bounded concurrency, and
//! writes back whatever changed. A failing order is logged and left for
//! the next tick; it never aborts its siblings.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use super::accrual::{AccrualClient, AccrualError};
use super::models::{Order, OrderUpdate};
use super::repository::{OrderRepository, UpdateOutcome};
use crate::db::StorageError;

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub poll_interval: Duration,
    /// Accrual requests in flight per tick
    pub max_in_flight: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(4),
            max_in_flight: 64,
        }
    }
}

/// Per-tick counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub polled: usize,
    pub updated: usize,
    pub credited: usize,
    pub unchanged: usize,
    pub failed: usize,
}

enum OrderOutcome {
    Updated { credited: bool },
    Unchanged,
}

#[derive(Debug, thiserror::Error)]
enum ReconcileError {
    #[error(transparent)]
    Accrual(#[from] AccrualError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

pub struct AccrualWorker {
    repo: Arc<dyn OrderRepository>,
    client: Arc<dyn AccrualClient>,
    config: WorkerConfig,
}

/// Handle to a running worker
pub struct WorkerHandle {
    shutdown: watch::Sender<bool>,
    join: JoinHandle<()>,
}

impl WorkerHandle {
    /// Signal the loop and wait until the current tick has finished.
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.join.await {
            error!("Accrual worker task failed: {}", e);
        }
    }
}

impl AccrualWorker {
    pub fn new(
        repo: Arc<dyn OrderRepository>,
        client: Arc<dyn AccrualClient>,
        config: WorkerConfig,
    ) -> Self {
        Self {
            repo,
            client,
            config,
        }
    }

    pub fn spawn(self) -> WorkerHandle {
        let (shutdown, rx) = watch::channel(false);
        let join = tokio::spawn(self.run(rx));
        WorkerHandle { shutdown, join }
    }

    async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!(
            "Accrual worker starting, poll interval: {:?}, max in flight: {}",
            self.config.poll_interval, self.config.max_in_flight
        );
        let period = self.config.poll_interval;
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    match self.reconcile_once().await {
                        Ok(report) if report.polled > 0 => debug!(?report, "accrual tick"),
                        Ok(_) => {}
                        Err(e) => error!("Failed to load unprocessed orders: {}", e),
                    }
                }
            }
        }
        info!("Accrual worker stopped");
    }

    /// Run a single reconciliation pass.
    ///
    /// Only a failure to list pending orders is returned; per-order
    /// failures are logged and counted in the report.
    pub async fn reconcile_once(&self) -> Result<TickReport, StorageError> {
        let orders = self.repo.list_unprocessed_orders().await?;
        let mut report = TickReport {
            polled: orders.len(),
            ..TickReport::default()
        };

        let limit = self.config.max_in_flight.max(1);
        let results: Vec<_> = futures::stream::iter(orders)
            .map(|order| async move {
                let number = order.number;
                (number, self.reconcile_order(order).await)
            })
            .buffer_unordered(limit)
            .collect()
            .await;

        for (number, result) in results {
            match result {
                Ok(OrderOutcome::Updated { credited }) => {
                    report.updated += 1;
                    if credited {
                        report.credited += 1;
                    }
                }
                Ok(OrderOutcome::Unchanged) => report.unchanged += 1,
                Err(ReconcileError::Accrual(e)) => {
                    report.failed += 1;
                    warn!(order = %number, "Accrual poll failed: {}", e);
                }
                Err(ReconcileError::Storage(e)) => {
                    report.failed += 1;
                    error!(order = %number, "Failed to store accrual result: {}", e);
                }
            }
        }
        Ok(report)
    }

    async fn reconcile_order(&self, order: Order) -> Result<OrderOutcome, ReconcileError> {
        let result = self.client.fetch(order.number).await?;
        if result.status == order.status && !result.status.is_terminal() {
            return Ok(OrderOutcome::Unchanged);
        }

        let update = OrderUpdate {
            number: order.number,
            status: result.status,
            accrual: result.accrual,
            processed_at: chrono::Utc::now(),
        };
        match self.repo.update_order(&update).await? {
            UpdateOutcome::Applied { credited } => {
                if let Some(amount) = credited {
                    info!(
                        order = %order.number,
                        user_id = %order.owner,
                        accrual = %amount,
                        "order processed, balance credited"
                    );
                }
                Ok(OrderOutcome::Updated {
                    credited: credited.is_some(),
                })
            }
            UpdateOutcome::Skipped => Ok(OrderOutcome::Unchanged),
        }
    }
}
