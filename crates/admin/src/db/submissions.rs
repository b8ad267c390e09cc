//! Listing submission repository.

use chrono::{DateTime, Utc};
use sqlx::{PgExecutor, PgPool};

use appy_link_core::catalog::ListingSubmission;
use appy_link_core::{AccountId, ProviderId, SubmissionId, SubmissionStatus};

use super::{RepositoryError, parse_slug};

#[derive(Debug, sqlx::FromRow)]
struct SubmissionRow {
    id: i32,
    company_name: String,
    category_id: String,
    website: Option<String>,
    description: String,
    discount: Option<String>,
    status: SubmissionStatus,
    reviewed_by: Option<i32>,
    reviewed_at: Option<DateTime<Utc>>,
    rejection_reason: Option<String>,
    provider_id: Option<i32>,
    created_at: DateTime<Utc>,
}

impl TryFrom<SubmissionRow> for ListingSubmission {
    type Error = RepositoryError;

    fn try_from(row: SubmissionRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: SubmissionId::new(row.id),
            company_name: row.company_name,
            category: parse_slug(&row.category_id)?,
            website: row.website,
            description: row.description,
            discount: row.discount,
            status: row.status,
            reviewed_by: row.reviewed_by.map(AccountId::new),
            reviewed_at: row.reviewed_at,
            rejection_reason: row.rejection_reason,
            provider_id: row.provider_id.map(ProviderId::new),
            created_at: row.created_at,
        })
    }
}

const SUBMISSION_COLUMNS: &str = "id, company_name, category_id, website, description, \
     discount, status, reviewed_by, reviewed_at, rejection_reason, provider_id, created_at";

/// Load a submission and lock its row until the transaction ends.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if there is no such submission.
pub async fn lock_for_review<'e>(
    executor: impl PgExecutor<'e>,
    id: SubmissionId,
) -> Result<ListingSubmission, RepositoryError> {
    sqlx::query_as::<_, SubmissionRow>(&format!(
        "SELECT {SUBMISSION_COLUMNS} FROM directory.listing_submissions WHERE id = $1 FOR UPDATE"
    ))
    .bind(id.as_i32())
    .fetch_optional(executor)
    .await?
    .ok_or(RepositoryError::NotFound)?
    .try_into()
}

/// Record a review verdict. Only a submission still in `new` is updated.
///
/// # Errors
///
/// Returns `RepositoryError::Conflict` if the submission was already reviewed.
pub async fn mark_reviewed<'e>(
    executor: impl PgExecutor<'e>,
    id: SubmissionId,
    status: SubmissionStatus,
    reviewer: AccountId,
    rejection_reason: Option<&str>,
    provider_id: Option<ProviderId>,
) -> Result<(), RepositoryError> {
    let result = sqlx::query(
        r"
        UPDATE directory.listing_submissions
        SET status = $2, reviewed_by = $3, reviewed_at = NOW(),
            rejection_reason = $4, provider_id = $5
        WHERE id = $1 AND status = 'new'
        ",
    )
    .bind(id.as_i32())
    .bind(status)
    .bind(reviewer.as_i32())
    .bind(rejection_reason)
    .bind(provider_id.map(|p| p.as_i32()))
    .execute(executor)
    .await?;

    if result.rows_affected() == 0 {
        return Err(RepositoryError::Conflict(format!(
            "submission {id} is no longer awaiting review"
        )));
    }
    Ok(())
}

/// Repository for listing submission reads.
pub struct SubmissionRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SubmissionRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Submissions in `status` (or all when `None`), newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        status: Option<SubmissionStatus>,
        limit: i64,
    ) -> Result<Vec<ListingSubmission>, RepositoryError> {
        let rows = sqlx::query_as::<_, SubmissionRow>(&format!(
            r"
            SELECT {SUBMISSION_COLUMNS}
            FROM directory.listing_submissions
            WHERE $1::directory.submission_status IS NULL OR status = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2
            "
        ))
        .bind(status)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(ListingSubmission::try_from).collect()
    }

    /// Number of submissions awaiting review.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_pending(&self) -> Result<i64, RepositoryError> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM directory.listing_submissions WHERE status = 'new'",
        )
        .fetch_one(self.pool)
        .await?;
        Ok(count)
    }
}
