use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};
use sqlx::PgPool;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::config::DatabaseConfig;

/// Errors from the pool and the repositories
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Duplicate value for {0}")]
    Duplicate(&'static str),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

impl DatabaseError {
    /// Map a unique-constraint violation onto `Duplicate`, keep anything else.
    pub fn unique_violation(err: sqlx::Error, field: &'static str) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => DatabaseError::Duplicate(field),
            _ => DatabaseError::Sqlx(err),
        }
    }
}

pub fn connect_options(config: &DatabaseConfig) -> PgConnectOptions {
    PgConnectOptions::new()
        .host(&config.host)
        .port(config.port)
        .username(&config.user)
        .password(&config.password)
        .database(&config.name)
        .ssl_mode(PgSslMode::Disable)
}

fn pool_options(config: &DatabaseConfig) -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.connection_timeout))
}

/// Open the pool and make sure the database answers.
pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, DatabaseError> {
    let pool = pool_options(config).connect_with(connect_options(config)).await?;
    health_check(&pool).await?;
    info!(host = %config.host, database = %config.name, "Database connection established");
    Ok(pool)
}

/// Build a pool that connects on first use.
pub fn connect_lazy(config: &DatabaseConfig) -> PgPool {
    pool_options(config).connect_lazy_with(connect_options(config))
}

pub async fn health_check(pool: &PgPool) -> Result<(), DatabaseError> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply the embedded migrations under `migrations/`.
pub async fn run_migrations(pool: &PgPool) -> Result<(), DatabaseError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    info!("Migrations applied successfully");
    Ok(())
}
