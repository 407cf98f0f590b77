//! Loyalty Ledger service entry point
//!
//! Usage: loyalty_ledger [-e <env>] [-a <host:port>] [-d <database uri>] [-r <accrual address>]

use std::sync::Arc;

use anyhow::Context;

use loyalty_ledger::config::{AppConfig, env_from_args};
use loyalty_ledger::db::{Database, MemoryStore};
use loyalty_ledger::gateway::{self, state::AppState};
use loyalty_ledger::ledger::{LedgerRepository, LedgerService};
use loyalty_ledger::orders::{AccrualWorker, HttpAccrualClient, OrderRepository, OrderService};
use loyalty_ledger::session::{CookieSigner, SessionStore, spawn_sweeper};
use loyalty_ledger::user_auth::{CredentialManager, CredentialRepository, SaltedHasher};

struct Repositories {
    orders: Arc<dyn OrderRepository>,
    ledger: Arc<dyn LedgerRepository>,
    credentials: Arc<dyn CredentialRepository>,
}

impl Repositories {
    fn from_store<S>(store: Arc<S>) -> Self
    where
        S: OrderRepository + LedgerRepository + CredentialRepository + 'static,
    {
        Self {
            orders: store.clone(),
            ledger: store.clone(),
            credentials: store,
        }
    }
}

async fn connect_storage(config: &AppConfig) -> anyhow::Result<(Repositories, Option<Arc<Database>>)> {
    match config.postgres_url.as_deref() {
        Some(url) => {
            let db = Database::connect(url)
                .await
                .context("Failed to connect to PostgreSQL")?;
            db.init_schema()
                .await
                .context("Failed to initialize database schema")?;
            tracing::info!("PostgreSQL storage ready");
            let repos = Repositories::from_store(Arc::new(db.store()));
            Ok((repos, Some(Arc::new(db))))
        }
        None => {
            tracing::warn!("No postgres_url configured, using in-memory storage (data is lost on exit)");
            Ok((Repositories::from_store(Arc::new(MemoryStore::new())), None))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let env = env_from_args(&args);
    let config = AppConfig::load(&env).context("Failed to load configuration")?;
    let _log_guard = loyalty_ledger::logging::init_logging(&config);

    tracing::info!("Starting Loyalty Ledger in {} mode", env);

    let (repos, db) = connect_storage(&config).await?;

    let accrual_client = HttpAccrualClient::new(config.accrual.client_config())
        .context("Failed to build accrual client")?;
    tracing::info!("Accrual service: {}", accrual_client.base_url());

    let sessions = Arc::new(SessionStore::new(config.session.ttl()));
    let cookies = CookieSigner::new(
        config.session.cookie_secret.as_bytes(),
        config.session.cookie_max_age_secs,
    );
    let hasher = SaltedHasher::new(config.credentials.password_salt.as_bytes());

    let state = Arc::new(AppState::new(
        Arc::new(OrderService::new(repos.orders.clone())),
        Arc::new(LedgerService::new(repos.ledger)),
        Arc::new(CredentialManager::new(repos.credentials, hasher)),
        sessions.clone(),
        cookies,
        db.clone(),
    ));

    let worker = AccrualWorker::new(
        repos.orders,
        Arc::new(accrual_client),
        config.accrual.worker_config(),
    )
    .spawn();
    let sweeper = spawn_sweeper(sessions, config.session.sweep_interval());

    let served = gateway::run_server(
        &config.gateway.bind_addr(),
        state,
        gateway::shutdown_signal(),
    )
    .await;

    tracing::info!("Stopping background tasks");
    worker.stop().await;
    sweeper.stop().await;
    if let Some(db) = db {
        db.close().await;
    }

    served.context("HTTP server failed")?;
    tracing::info!("Shutdown complete");
    Ok(())
}
