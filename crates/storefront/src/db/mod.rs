//! Database operations for the storefront.
//!
//! The storefront reads the `directory` schema and only ever inserts into
//! `directory.listing_submissions` and `directory.contact_messages`. Schema
//! changes live in the workspace `migrations/` directory and are applied with:
//!
//! ```bash
//! cargo run -p appy-link-cli -- migrate
//! ```

pub mod directory;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use directory::DirectoryRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// The pool connects lazily so a storefront whose database is briefly down
/// still starts and serves the built-in directory.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection string cannot be parsed.
pub fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(0)
        .acquire_timeout(Duration::from_secs(5))
        .connect_lazy(database_url.expose_secret())
}
