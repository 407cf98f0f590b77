use sqlx::PgPool;

/// Create the ledger tables if they are missing. Safe to run on every start.
pub async fn init_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    tracing::info!("Initializing PostgreSQL schema...");

    for (name, ddl) in [
        ("users", CREATE_USERS_TABLE),
        ("credentials", CREATE_CREDENTIALS_TABLE),
        ("orders", CREATE_ORDERS_TABLE),
        ("orders status index", CREATE_ORDERS_STATUS_INDEX),
        ("withdrawals", CREATE_WITHDRAWALS_TABLE),
    ] {
        sqlx::query(ddl).execute(pool).await.map_err(|e| {
            tracing::error!("Failed to create {}: {}", name, e);
            e
        })?;
    }

    tracing::info!("PostgreSQL schema initialized successfully");
    Ok(())
}

// Amounts are BIGINT minor units (1/100 point).
const CREATE_USERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id          UUID PRIMARY KEY,
    current     BIGINT NOT NULL DEFAULT 0 CHECK (current >= 0),
    collected   BIGINT NOT NULL DEFAULT 0,
    withdrawn   BIGINT NOT NULL DEFAULT 0,
    created_at  TIMESTAMPTZ NOT NULL DEFAULT now()
)
"#;

const CREATE_CREDENTIALS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS credentials (
    login       TEXT PRIMARY KEY,
    password    TEXT NOT NULL,
    user_id     UUID NOT NULL REFERENCES users (id)
)
"#;

const CREATE_ORDERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS orders (
    id            UUID PRIMARY KEY,
    user_id       UUID NOT NULL REFERENCES users (id),
    number        BIGINT NOT NULL UNIQUE,
    status        TEXT NOT NULL,
    accrual       BIGINT,
    uploaded_at   TIMESTAMPTZ NOT NULL,
    processed_at  TIMESTAMPTZ
)
"#;

const CREATE_ORDERS_STATUS_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS orders_status_idx ON orders (status)
    WHERE status IN ('NEW', 'PROCESSING')
"#;

const CREATE_WITHDRAWALS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS withdrawals (
    id            UUID PRIMARY KEY,
    user_id       UUID NOT NULL REFERENCES users (id),
    number        BIGINT NOT NULL,
    sum           BIGINT NOT NULL CHECK (sum > 0),
    processed_at  TIMESTAMPTZ NOT NULL
)
"#;
