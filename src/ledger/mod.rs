//! Balance / Withdrawal Ledger
//!
//! Balance is derived from collected and withdrawn totals. A withdrawal is
//! recorded only if the owner's current balance covers it.

pub mod error;
pub mod models;
pub mod repository;
pub mod service;

pub use error::LedgerError;
pub use models::{Balance, BalanceView, WithdrawRequest, Withdrawal, WithdrawalView};
pub use repository::{LedgerRepository, WithdrawOutcome};
pub use service::LedgerService;
