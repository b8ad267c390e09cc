//! Submission review and catalog integrity operations.
//!
//! Each operation runs in one transaction. The review rules come from
//! `appy_link_core::moderation`; this module supplies the locking.

use sqlx::PgPool;
use thiserror::Error;

use appy_link_core::catalog::Category;
use appy_link_core::moderation::{
    Decision, RuleViolation, apply_decision, check_category_deletion, provider_from_submission,
};
use appy_link_core::{AccountId, CategorySlug, ProviderId, SubmissionId};

use crate::db::RepositoryError;
use crate::db::catalog::{
    category_exists, count_providers_in, delete_category, insert_category, insert_provider,
    repoint_pending_submissions, repoint_providers, update_category_fields,
};
use crate::db::submissions::{lock_for_review, mark_reviewed};

/// Errors from moderation and catalog integrity operations.
#[derive(Debug, Error)]
pub enum ModerationError {
    /// The submission or category does not exist.
    #[error("not found")]
    NotFound,

    /// A review or deletion rule refused the operation.
    #[error("{0}")]
    Rule(#[from] RuleViolation),

    /// Approving would file the provider under a category that no longer exists.
    #[error("Category \"{0}\" no longer exists. Recreate the category first.")]
    UnknownCategory(String),

    /// A uniqueness or reference constraint refused the write.
    #[error("{0}")]
    Conflict(String),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(RepositoryError),
}

impl From<RepositoryError> for ModerationError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => Self::NotFound,
            RepositoryError::Conflict(message) => Self::Conflict(message),
            other => Self::Repository(other),
        }
    }
}

impl From<sqlx::Error> for ModerationError {
    fn from(err: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(err))
    }
}

/// Transactional moderation operations.
pub struct ModerationService<'a> {
    pool: &'a PgPool,
}

impl<'a> ModerationService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Approve a submission: create its provider and mark it approved, or
    /// do neither.
    ///
    /// # Errors
    ///
    /// Returns `ModerationError::NotFound` if the submission does not exist.
    /// Returns `ModerationError::Rule` if it was already reviewed.
    /// Returns `ModerationError::UnknownCategory` if its category was deleted.
    pub async fn approve(
        &self,
        id: SubmissionId,
        reviewer: AccountId,
    ) -> Result<ProviderId, ModerationError> {
        let mut tx = self.pool.begin().await?;

        let submission = lock_for_review(&mut *tx, id).await?;
        let status = apply_decision(submission.status, &Decision::Approve)?;

        if !category_exists(&mut *tx, &submission.category).await? {
            return Err(ModerationError::UnknownCategory(
                submission.category.as_str().to_string(),
            ));
        }

        let provider_id = insert_provider(&mut *tx, &provider_from_submission(&submission)).await?;
        mark_reviewed(&mut *tx, id, status, reviewer, None, Some(provider_id)).await?;

        tx.commit().await?;

        tracing::info!(
            submission_id = %id,
            provider_id = %provider_id,
            reviewer = %reviewer,
            "Submission approved"
        );
        Ok(provider_id)
    }

    /// Reject a submission with an optional reason (blank means none).
    ///
    /// # Errors
    ///
    /// Returns `ModerationError::NotFound` if the submission does not exist.
    /// Returns `ModerationError::Rule` if it was already reviewed.
    pub async fn reject(
        &self,
        id: SubmissionId,
        reviewer: AccountId,
        reason: &str,
    ) -> Result<(), ModerationError> {
        let decision = Decision::reject(reason);
        let mut tx = self.pool.begin().await?;

        let submission = lock_for_review(&mut *tx, id).await?;
        let status = apply_decision(submission.status, &decision)?;
        let reason = match &decision {
            Decision::Reject { reason } => reason.as_deref(),
            Decision::Approve => None,
        };
        mark_reviewed(&mut *tx, id, status, reviewer, reason, None).await?;

        tx.commit().await?;

        tracing::info!(submission_id = %id, reviewer = %reviewer, "Submission rejected");
        Ok(())
    }

    /// Save an edited category. When the id changes, its providers and any
    /// pending submissions move to the new id in the same transaction.
    ///
    /// Returns the number of providers re-pointed.
    ///
    /// # Errors
    ///
    /// Returns `ModerationError::NotFound` if `current` does not exist.
    /// Returns `ModerationError::Conflict` if the new id is taken.
    pub async fn update_category(
        &self,
        current: &CategorySlug,
        updated: &Category,
    ) -> Result<u64, ModerationError> {
        if &updated.id == current {
            update_category_fields(self.pool, updated).await?;
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;

        if !category_exists(&mut *tx, current).await? {
            return Err(ModerationError::NotFound);
        }
        insert_category(&mut *tx, updated).await?;
        let moved = repoint_providers(&mut *tx, current, &updated.id).await?;
        repoint_pending_submissions(&mut *tx, current, &updated.id).await?;
        delete_category(&mut *tx, current).await?;

        tx.commit().await?;

        tracing::info!(
            from = %current,
            to = %updated.id,
            providers = moved,
            "Category renamed"
        );
        Ok(moved)
    }

    /// Delete a category that no provider uses.
    ///
    /// # Errors
    ///
    /// Returns `ModerationError::Rule` with the advisory message while any
    /// provider (active or hidden) still references it.
    /// Returns `ModerationError::NotFound` if it does not exist.
    pub async fn delete_category(&self, id: &CategorySlug) -> Result<(), ModerationError> {
        let mut tx = self.pool.begin().await?;

        let in_use = count_providers_in(&mut *tx, id).await?;
        check_category_deletion(in_use)?;
        delete_category(&mut *tx, id).await?;

        tx.commit().await?;

        tracing::info!(category = %id, "Category deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use appy_link_core::SubmissionStatus;

    use super::*;

    #[test]
    fn test_repository_errors_map_to_moderation_errors() {
        assert!(matches!(
            ModerationError::from(RepositoryError::NotFound),
            ModerationError::NotFound
        ));
        assert!(matches!(
            ModerationError::from(RepositoryError::Conflict("taken".into())),
            ModerationError::Conflict(m) if m == "taken"
        ));
        assert!(matches!(
            ModerationError::from(RepositoryError::DataCorruption("x".into())),
            ModerationError::Repository(_)
        ));
    }

    #[test]
    fn test_rule_messages_pass_through() {
        let err = ModerationError::from(RuleViolation::CategoryInUse(2));
        assert_eq!(
            err.to_string(),
            "Cannot delete: 2 provider(s) still use this category. Reassign them first."
        );
        let err = ModerationError::from(RuleViolation::AlreadyReviewed(SubmissionStatus::Rejected));
        assert_eq!(err.to_string(), "This submission was already rejected.");
    }
}
