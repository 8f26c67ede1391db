//! Persistence layer: connection pool, entity models, and repositories.
//!
//! All durable state lives in two record collections (`slots`,
//! `swap_requests`) plus the minimal `users` mirror; every query is owned
//! by a repository in [`repositories`].

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;

pub mod config;
pub mod models;
pub mod repositories;

pub use config::DatabaseConfig;

pub type DbPool = sqlx::PgPool;

/// Create a connection pool from a configuration.
pub async fn connect(config: &DatabaseConfig) -> Result<DbPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .connect(&config.url)
        .await?;
    tracing::info!(
        max_connections = config.max_connections,
        "Database connection pool created"
    );
    Ok(pool)
}

/// Load `.env` if present, read configuration from the environment, and
/// connect.
pub async fn connect_from_env() -> Result<DbPool, sqlx::Error> {
    dotenvy::dotenv().ok();
    let config = DatabaseConfig::from_env();
    connect(&config).await
}

/// Apply all pending migrations from `db/migrations`.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../db/migrations").run(pool).await?;
    tracing::info!("Database migrations applied");
    Ok(())
}
