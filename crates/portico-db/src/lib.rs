//! Postgres repositories for the portico service.
//!
//! Every query that reads user-owned data is scoped by the caller's identity
//! parameters, mirroring the row policies the hosted store enforces on its
//! side. The repositories use dynamic queries so no live database is needed
//! at compile time.

pub mod db;

pub use db::audit::AuditLogRepository;
pub use db::lease::LeaseRepository;
pub use db::property::PropertyRepository;
pub use db::registry::RegistryRepository;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;

/// Connect a pool with the configured limits.
pub async fn connect(
    database_url: &str,
    max_connections: u32,
    timeout_seconds: u64,
) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(timeout_seconds))
        .connect(database_url)
        .await
}

/// Apply pending schema migrations.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
