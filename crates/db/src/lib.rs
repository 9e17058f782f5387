//! Persistence layer for the scout engine.
//!
//! Models mirror table rows; repositories are zero-sized structs whose
//! async methods take `&PgPool` first. [`retention::PgExpirableStore`]
//! adapts the expirable-entity tables to the core sweeper.

use sqlx::postgres::PgPoolOptions;

pub mod models;
pub mod repositories;
pub mod retention;

pub type DbPool = sqlx::PgPool;

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(20)
        .connect(database_url)
        .await
}

/// Verify the database answers a trivial query.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(pool)
        .await
        .map(|_| ())
}

/// Apply pending migrations from `db/migrations`.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../db/migrations").run(pool).await
}
