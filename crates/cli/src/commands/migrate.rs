//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! appy-cli migrate
//! ```
//!
//! Runs the directory and admin migrations from `migrations/`, then creates
//! the session table used by both web binaries.

use tower_sessions_sqlx_store::PostgresStore;

use super::{CliError, connect};

/// Run all migrations.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a migration fails.
pub async fn run() -> Result<(), CliError> {
    let pool = connect().await?;

    tracing::info!("Running directory and admin migrations...");
    sqlx::migrate!("../../migrations").run(&pool).await?;

    tracing::info!("Creating session store table...");
    PostgresStore::new(pool).migrate().await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
