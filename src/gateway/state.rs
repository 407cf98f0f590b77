use std::sync::Arc;

use crate::db::Database;
use crate::ledger::LedgerService;
use crate::orders::OrderService;
use crate::session::{CookieSigner, SessionStore};
use crate::user_auth::CredentialManager;

/// Gateway application state (shared across handlers)
///
/// One handle per capability; handlers only reach the services they use.
#[derive(Clone)]
pub struct AppState {
    /// Order upload / listing
    pub orders: Arc<OrderService>,
    /// Balance and withdrawals
    pub ledger: Arc<LedgerService>,
    /// Registration and login
    pub credentials: Arc<CredentialManager>,
    /// Live sessions
    pub sessions: Arc<SessionStore>,
    /// Session cookie signing
    pub cookies: CookieSigner,
    /// PostgreSQL (None when running on the in-memory store)
    pub db: Option<Arc<Database>>,
}

impl AppState {
    pub fn new(
        orders: Arc<OrderService>,
        ledger: Arc<LedgerService>,
        credentials: Arc<CredentialManager>,
        sessions: Arc<SessionStore>,
        cookies: CookieSigner,
        db: Option<Arc<Database>>,
    ) -> Self {
        Self {
            orders,
            ledger,
            credentials,
            sessions,
            cookies,
            db,
        }
    }
}
