//! Database operations for the directory's `PostgreSQL` store.
//!
//! ## Tables
//!
//! - `users` - Registered users (argon2 password hashes)
//! - `stores` - Listed stores with tags, coordinates and author
//! - `reviews` - Store ratings, joined by the top stores ranking
//! - `user_hearts` - Hearted stores per user, in insertion order
//!
//! # Migrations
//!
//! Migrations are stored in `crates/data/migrations/` and run via:
//! ```bash
//! cargo run -p storefinder-cli -- migrate
//! ```

pub mod reviews;
pub mod stores;
pub mod users;

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use reviews::ReviewRepository;
pub use stores::StoreRepository;
pub use users::UserRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Translate constraint violations into `Conflict`/`NotFound`.
///
/// `unique` names what was duplicated, `missing` what a foreign key pointed at.
pub(crate) fn map_constraint(e: sqlx::Error, unique: &str, missing: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e {
        if db_err.is_unique_violation() {
            return RepositoryError::Conflict(format!("{unique} already exists"));
        }
        if db_err.is_foreign_key_violation() {
            return RepositoryError::NotFound(missing.to_owned());
        }
    }
    RepositoryError::Database(e)
}

/// Convert a non-negative row count from `COUNT(*)`.
pub(crate) fn count_to_u64(count: i64) -> Result<u64, RepositoryError> {
    u64::try_from(count)
        .map_err(|_| RepositoryError::DataCorruption(format!("negative row count {count}")))
}

/// Clamp a `u64` limit or offset into the `BIGINT` range.
pub(crate) fn to_bigint(n: u64) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

/// Create a `PostgreSQL` connection pool.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
/// * `max_connections` - Upper bound on pooled connections
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(
    database_url: &SecretString,
    max_connections: u32,
) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Embedded migrations from `crates/data/migrations/`.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Apply pending migrations.
///
/// # Errors
///
/// Returns `sqlx::migrate::MigrateError` if a migration fails.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    MIGRATOR.run(pool).await
}
