//! Persistence for the renewables service.
//!
//! - [`store`] -- the [`DocumentStore`](store::DocumentStore) abstraction and
//!   its in-memory and Postgres backends.
//! - [`health`] -- tracks whether the store is reachable and reconnects in
//!   the background after a failure.
//! - [`database`] -- health-gated facade handed to handlers.
//! - [`cache`] -- response cache with staleness eviction.
//! - [`repositories`] -- typed access to the renewables and webhook collections.

use sqlx::postgres::PgPoolOptions;

pub mod cache;
pub mod database;
pub mod health;
pub mod repositories;
pub mod store;

pub use database::{Database, DbError, DbResult};

pub type DbPool = sqlx::PgPool;

/// A stored JSON document: field name to value.
pub type Document = serde_json::Map<String, serde_json::Value>;

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(20)
        .connect(database_url)
        .await
}

/// Apply the embedded schema migrations.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
