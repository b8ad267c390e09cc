//! One-time sign-in, sign-up confirmation and password reset tokens.
//!
//! Only the SHA-256 of a token is stored. A sign-up token also carries the
//! password hash chosen at sign-up, applied once the address is confirmed. Consuming a token marks it used in
//! the same statement that reads it, so a link works exactly once even when
//! clicked twice concurrently.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use appy_link_core::Email;

use super::RepositoryError;

/// What a token may be exchanged for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenPurpose {
    MagicLink,
    PasswordReset,
    SignUp,
}

impl TokenPurpose {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MagicLink => "magic_link",
            Self::PasswordReset => "password_reset",
            Self::SignUp => "sign_up",
        }
    }
}

/// A used-up token: the address it was sent to, plus the pending password
/// for sign-up tokens.
#[derive(Debug, Clone)]
pub struct RedeemedToken {
    pub email: Email,
    pub password_hash: Option<String>,
}

/// Repository for `admin.login_token`.
pub struct LoginTokenRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> LoginTokenRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Store a token hash for `email`. `password_hash` is required for
    /// [`TokenPurpose::SignUp`] and refused for the other purposes.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        email: &Email,
        token_hash: &str,
        purpose: TokenPurpose,
        password_hash: Option<&str>,
        expires_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO admin.login_token (email, token_hash, purpose, password_hash, expires_at)
            VALUES ($1, $2, $3, $4, $5)
            ",
        )
        .bind(email.as_str())
        .bind(token_hash)
        .bind(purpose.as_str())
        .bind(password_hash)
        .bind(expires_at)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    /// Exchange an unused, unexpired token for what it was issued with.
    ///
    /// Returns `None` for unknown, used, expired or wrong-purpose tokens.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    /// Returns `RepositoryError::DataCorruption` if the stored email is invalid.
    pub async fn consume(
        &self,
        token_hash: &str,
        purpose: TokenPurpose,
    ) -> Result<Option<RedeemedToken>, RepositoryError> {
        let row: Option<(String, Option<String>)> = sqlx::query_as(
            r"
            UPDATE admin.login_token
            SET used_at = NOW()
            WHERE token_hash = $1
              AND purpose = $2
              AND used_at IS NULL
              AND expires_at > NOW()
            RETURNING email, password_hash
            ",
        )
        .bind(token_hash)
        .bind(purpose.as_str())
        .fetch_optional(self.pool)
        .await?;

        row.map(|(raw, password_hash)| {
            let email = Email::parse(&raw).map_err(|e| {
                RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
            })?;
            Ok(RedeemedToken {
                email,
                password_hash,
            })
        })
        .transpose()
    }

    /// Check a token without using it up, for rendering the reset form.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn is_valid(
        &self,
        token_hash: &str,
        purpose: TokenPurpose,
    ) -> Result<bool, RepositoryError> {
        let (valid,): (bool,) = sqlx::query_as(
            r"
            SELECT EXISTS (
                SELECT 1 FROM admin.login_token
                WHERE token_hash = $1
                  AND purpose = $2
                  AND used_at IS NULL
                  AND expires_at > NOW()
            )
            ",
        )
        .bind(token_hash)
        .bind(purpose.as_str())
        .fetch_one(self.pool)
        .await?;
        Ok(valid)
    }

    /// Delete tokens that expired more than a day ago.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn purge_expired(&self) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            "DELETE FROM admin.login_token WHERE expires_at < NOW() - INTERVAL '1 day'",
        )
        .execute(self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}
