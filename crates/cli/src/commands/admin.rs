//! Admin account management commands.
//!
//! # Usage
//!
//! ```bash
//! # Create an account (signs in by magic link)
//! appy-cli admin create -e editor@appylink.co.uk -r editor
//!
//! # Create an account with a password read from stdin
//! echo "$PASSWORD" | appy-cli admin create -e editor@appylink.co.uk -r editor --password-stdin
//!
//! # Grant or revoke a role
//! appy-cli admin grant -e someone@appylink.co.uk -r viewer
//! appy-cli admin grant -e someone@appylink.co.uk -r none
//!
//! # List accounts
//! appy-cli admin list
//! ```
//!
//! # Environment Variables
//!
//! - `ADMIN_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)

use std::io::BufRead;

use appy_link_admin::db::{Account, AccountRepository};
use appy_link_admin::services::auth::{MIN_PASSWORD_LENGTH, hash_password};
use appy_link_core::{AdminRole, Email};

use super::{CliError, connect};

/// Parse a role argument. `none` means no role.
///
/// # Errors
///
/// Returns `CliError::InvalidRole` for anything else.
pub fn parse_role(raw: &str) -> Result<Option<AdminRole>, CliError> {
    match raw.trim() {
        "none" => Ok(None),
        other => other
            .parse()
            .map(Some)
            .map_err(|_| CliError::InvalidRole(raw.to_owned())),
    }
}

/// Read one line from stdin as a password.
fn read_password() -> Result<String, CliError> {
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    let password = line.trim_end_matches(['\r', '\n']).to_owned();

    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(CliError::Password(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(password)
}

/// Create an account.
///
/// # Errors
///
/// Returns an error if the email or role is invalid, the password is too
/// short, or the account already exists.
pub async fn create(email: &str, role: &str, password_stdin: bool) -> Result<Account, CliError> {
    let email = Email::parse(email)?;
    let role = parse_role(role)?;

    let password_hash = if password_stdin {
        let password = read_password()?;
        Some(hash_password(&password).map_err(|e| CliError::Password(e.to_string()))?)
    } else {
        None
    };

    let pool = connect().await?;
    let account = AccountRepository::new(&pool)
        .create(&email, password_hash.as_deref(), role)
        .await?;

    tracing::info!(
        "Account created! ID: {}, Email: {}, Role: {}",
        account.id,
        account.email,
        role.map_or_else(|| "none".to_owned(), |r| r.to_string())
    );
    if password_hash.is_none() {
        tracing::info!("No password set. The account signs in with a magic link.");
    }
    Ok(account)
}

/// Set or clear an account's role. Takes effect at its next sign-in.
///
/// # Errors
///
/// Returns an error if the email or role is invalid or there is no such account.
pub async fn grant(email: &str, role: &str) -> Result<(), CliError> {
    let email = Email::parse(email)?;
    let role = parse_role(role)?;

    let pool = connect().await?;
    AccountRepository::new(&pool).set_role(&email, role).await?;

    tracing::info!(email = %email, role = ?role, "Role updated");
    Ok(())
}

/// Print every account, newest first.
///
/// # Errors
///
/// Returns an error if the database is unreachable.
pub async fn list() -> Result<(), CliError> {
    let pool = connect().await?;
    let accounts = AccountRepository::new(&pool).list().await?;

    #[allow(clippy::print_stdout)]
    {
        println!("{:<6} {:<40} {:<8} {:<9} LAST SIGN-IN", "ID", "EMAIL", "ROLE", "PASSWORD");
        for account in &accounts {
            println!(
                "{:<6} {:<40} {:<8} {:<9} {}",
                account.id,
                account.email,
                account.role.map_or_else(|| "none".to_owned(), |r| r.to_string()),
                if account.password_hash.is_some() { "yes" } else { "no" },
                account
                    .last_sign_in_at
                    .map_or_else(|| "never".to_owned(), |at| at.format("%Y-%m-%d %H:%M").to_string()),
            );
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_role() {
        assert_eq!(parse_role("editor").unwrap(), Some(AdminRole::Editor));
        assert_eq!(parse_role("none").unwrap(), None);
        assert!(matches!(parse_role("owner"), Err(CliError::InvalidRole(r)) if r == "owner"));
    }
}
