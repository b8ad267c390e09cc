//! Database operations for the admin portal.
//!
//! ## Tables
//!
//! - `admin.account` - Portal identities (email, optional password hash, optional role)
//! - `admin.login_token` - One-time magic link, sign-up and password reset tokens (hashed)
//! - `directory.categories` / `directory.providers` - The catalog
//! - `directory.listing_submissions` - Public submissions awaiting review
//! - `directory.contact_messages` - Read-only inbox
//!
//! # Migrations
//!
//! Migrations live in the workspace `migrations/` directory and are run via:
//! ```bash
//! cargo run -p appy-link-cli -- migrate
//! ```

pub mod accounts;
pub mod catalog;
pub mod login_tokens;
pub mod messages;
pub mod submissions;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use appy_link_core::CategorySlug;

pub use accounts::{Account, AccountRepository};
pub use catalog::{CatalogRepository, CategoryUsage};
pub use login_tokens::{LoginTokenRepository, RedeemedToken, TokenPurpose};
pub use messages::MessageRepository;
pub use submissions::SubmissionRepository;

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
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map unique and foreign key violations to `Conflict`, leaving other
    /// database errors as they are.
    pub(crate) fn from_write(err: sqlx::Error, what: &str) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                Self::Conflict(format!("{what} already exists"))
            }
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                Self::Conflict(format!("{what} references a missing or in-use record"))
            }
            _ => Self::Database(err),
        }
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

pub(crate) fn parse_slug(raw: &str) -> Result<CategorySlug, RepositoryError> {
    CategorySlug::parse(raw).map_err(|e| {
        RepositoryError::DataCorruption(format!("invalid category id {raw:?} in database: {e}"))
    })
}
