//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! storefinder migrate
//! ```
//!
//! # Environment Variables
//!
//! - `STOREFINDER_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! # Migration Files
//!
//! Migrations live in `crates/data/migrations/` and are embedded at build time.

use tracing::info;

use storefinder_data::DirectoryConfig;
use storefinder_data::db;

/// Apply pending migrations to the configured database.
///
/// # Errors
///
/// Returns an error if configuration is missing, the database is
/// unreachable, or a migration fails.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = DirectoryConfig::from_env()?;

    info!("Connecting to database...");
    let pool = db::create_pool(&config.database_url, config.max_connections).await?;

    info!("Running migrations...");
    db::run_migrations(&pool).await?;

    info!("Migrations complete!");
    Ok(())
}
