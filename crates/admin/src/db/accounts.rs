//! Account repository: portal identities and their roles.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use appy_link_core::{AccountId, AdminRole, Email};

use super::RepositoryError;

/// A portal account.
///
/// `password_hash` is absent for accounts that only ever used magic links.
/// `role` is absent until an admin (or the CLI) grants one.
#[derive(Debug, Clone)]
pub struct Account {
    pub id: AccountId,
    pub email: Email,
    pub password_hash: Option<String>,
    pub role: Option<AdminRole>,
    pub created_at: DateTime<Utc>,
    pub last_sign_in_at: Option<DateTime<Utc>>,
}

#[derive(Debug, sqlx::FromRow)]
struct AccountRow {
    id: i32,
    email: String,
    password_hash: Option<String>,
    role: Option<AdminRole>,
    created_at: DateTime<Utc>,
    last_sign_in_at: Option<DateTime<Utc>>,
}

impl TryFrom<AccountRow> for Account {
    type Error = RepositoryError;

    fn try_from(row: AccountRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: AccountId::new(row.id),
            email,
            password_hash: row.password_hash,
            role: row.role,
            created_at: row.created_at,
            last_sign_in_at: row.last_sign_in_at,
        })
    }
}

const ACCOUNT_COLUMNS: &str = "id, email, password_hash, role, created_at, last_sign_in_at";

/// Repository for `admin.account`.
pub struct AccountRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AccountRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Look up an account by email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_email(&self, email: &Email) -> Result<Option<Account>, RepositoryError> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM admin.account WHERE email = $1"
        ))
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        row.map(Account::try_from).transpose()
    }

    /// All accounts, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Account>, RepositoryError> {
        let rows = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM admin.account ORDER BY created_at DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Account::try_from).collect()
    }

    /// Create an account.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email is already registered.
    pub async fn create(
        &self,
        email: &Email,
        password_hash: Option<&str>,
        role: Option<AdminRole>,
    ) -> Result<Account, RepositoryError> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            r"
            INSERT INTO admin.account (email, password_hash, role)
            VALUES ($1, $2, $3)
            RETURNING {ACCOUNT_COLUMNS}
            "
        ))
        .bind(email.as_str())
        .bind(password_hash)
        .bind(role)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, "account"))?;

        row.try_into()
    }

    /// Return the account for `email`, creating a role-less one on first use.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_or_create(&self, email: &Email) -> Result<Account, RepositoryError> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            r"
            INSERT INTO admin.account (email)
            VALUES ($1)
            ON CONFLICT (email) DO UPDATE SET email = EXCLUDED.email
            RETURNING {ACCOUNT_COLUMNS}
            "
        ))
        .bind(email.as_str())
        .fetch_one(self.pool)
        .await?;

        row.try_into()
    }

    /// Replace the password hash for `email`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if there is no such account.
    pub async fn set_password_hash(
        &self,
        email: &Email,
        password_hash: &str,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE admin.account
            SET password_hash = $2, updated_at = NOW()
            WHERE email = $1
            ",
        )
        .bind(email.as_str())
        .bind(password_hash)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Grant `role` to `email`, or revoke with `None`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if there is no such account.
    pub async fn set_role(
        &self,
        email: &Email,
        role: Option<AdminRole>,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE admin.account
            SET role = $2, updated_at = NOW()
            WHERE email = $1
            ",
        )
        .bind(email.as_str())
        .bind(role)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Record a successful sign-in.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn touch_sign_in(&self, id: AccountId) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE admin.account SET last_sign_in_at = NOW() WHERE id = $1")
            .bind(id.as_i32())
            .execute(self.pool)
            .await?;
        Ok(())
    }
}
