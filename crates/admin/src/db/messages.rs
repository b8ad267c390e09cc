//! Contact message inbox (read-only).

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use appy_link_core::ContactMessageId;
use appy_link_core::catalog::ContactMessage;

use super::RepositoryError;

#[derive(Debug, sqlx::FromRow)]
struct ContactMessageRow {
    id: i32,
    name: String,
    email: String,
    message: String,
    created_at: DateTime<Utc>,
}

impl From<ContactMessageRow> for ContactMessage {
    fn from(row: ContactMessageRow) -> Self {
        Self {
            id: ContactMessageId::new(row.id),
            name: row.name,
            email: row.email,
            message: row.message,
            created_at: row.created_at,
        }
    }
}

/// Repository for `directory.contact_messages`.
pub struct MessageRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> MessageRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Most recent messages first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_recent(&self, limit: i64) -> Result<Vec<ContactMessage>, RepositoryError> {
        let rows = sqlx::query_as::<_, ContactMessageRow>(
            r"
            SELECT id, name, email, message, created_at
            FROM directory.contact_messages
            ORDER BY created_at DESC, id DESC
            LIMIT $1
            ",
        )
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(ContactMessage::from).collect())
    }

    /// Total number of messages.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM directory.contact_messages")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }
}
