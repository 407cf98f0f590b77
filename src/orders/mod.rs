//! Order Engine
//!
//! Upload and listing of purchase orders, plus the background loop that
//! reconciles pending orders against the external accrual service.

pub mod accrual;
pub mod error;
pub mod models;
pub mod repository;
pub mod service;
pub mod worker;

pub use accrual::{AccrualClient, AccrualClientConfig, AccrualError, HttpAccrualClient};
pub use error::OrderError;
pub use models::{Order, OrderStatus, OrderUpdate, OrderView};
pub use repository::{CreateOutcome, OrderRepository, UpdateOutcome};
pub use service::{OrderService, UploadOutcome};
pub use worker::{AccrualWorker, TickReport, WorkerConfig, WorkerHandle};
