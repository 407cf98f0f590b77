//! Loyalty Ledger - loyalty points accrual and withdrawal service
//!
//! # Modules
//!
//! - [`core_types`] - Core identifiers (UserId)
//! - [`money`] - Minor-unit currency
//! - [`order_number`] - Luhn-checked order numbers
//! - [`orders`] - Order upload and the accrual reconciliation worker
//! - [`ledger`] - Balances and withdrawals
//! - [`session`] - Session store and signed cookies
//! - [`user_auth`] - Registration, login and the session middleware
//! - [`db`] - PostgreSQL and in-memory storage
//! - [`gateway`] - HTTP API

// Core types - must be first!
pub mod core_types;
pub mod money;
pub mod order_number;

// Domain
pub mod ledger;
pub mod orders;
pub mod session;
pub mod user_auth;

// Infrastructure
pub mod config;
pub mod db;
pub mod gateway;
pub mod logging;

// Convenient re-exports at crate root
pub use core_types::UserId;
pub use money::Currency;
pub use order_number::{OrderNumber, OrderNumberError};

pub use db::{Database, MemoryStore, PgStore, StorageError};
pub use gateway::state::AppState;
pub use ledger::{Balance, LedgerError, LedgerService, Withdrawal};
pub use orders::{AccrualWorker, HttpAccrualClient, Order, OrderError, OrderService, OrderStatus};
pub use session::{CookieSigner, SessionStore};
pub use user_auth::{AuthError, CredentialManager, SaltedHasher};
