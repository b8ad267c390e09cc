//! Sign-in token maintenance.

use appy_link_admin::db::LoginTokenRepository;

use super::{CliError, connect};

/// Delete sign-in and reset tokens that expired more than a day ago.
///
/// # Errors
///
/// Returns an error if the database is unreachable.
pub async fn purge() -> Result<u64, CliError> {
    let pool = connect().await?;
    let removed = LoginTokenRepository::new(&pool).purge_expired().await?;
    tracing::info!(removed, "Purged expired sign-in tokens");
    Ok(removed)
}
