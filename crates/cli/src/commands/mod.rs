//! Command implementations and the pieces they share.

pub mod admin;
pub mod migrate;
pub mod seed;
pub mod tokens;

use secrecy::SecretString;
use sqlx::PgPool;
use thiserror::Error;

use appy_link_admin::db::{self, RepositoryError};
use appy_link_core::env::Env;

/// Errors from any CLI command.
#[derive(Debug, Error)]
pub enum CliError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection or query error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration failed.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Repository error.
    #[error("{0}")]
    Repository(#[from] RepositoryError),

    /// Invalid role.
    #[error("Invalid role: {0}. Valid roles: admin, editor, viewer, none")]
    InvalidRole(String),

    /// Invalid email.
    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] appy_link_core::EmailError),

    /// Password rejected.
    #[error("{0}")]
    Password(String),

    /// Reading from the terminal failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// `ADMIN_DATABASE_URL`, falling back to `DATABASE_URL`.
///
/// # Errors
///
/// Returns `CliError::MissingEnvVar` if neither is set.
pub fn database_url() -> Result<SecretString, CliError> {
    Env::process()
        .first_of(&["ADMIN_DATABASE_URL", "DATABASE_URL"])
        .map(SecretString::from)
        .ok_or(CliError::MissingEnvVar("ADMIN_DATABASE_URL"))
}

/// Connect to the database named by the environment.
///
/// # Errors
///
/// Returns an error if the URL is missing or the connection fails.
pub async fn connect() -> Result<PgPool, CliError> {
    let url = database_url()?;
    tracing::info!("Connecting to database...");
    Ok(db::create_pool(&url).await?)
}
