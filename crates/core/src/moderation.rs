//! Submission review and catalog integrity rules.
//!
//! The admin crate performs these inside database transactions; the rules
//! themselves are pure so they can be tested here.

use crate::catalog::{Discount, ListingSubmission};
use crate::types::{ProviderTier, SubmissionStatus};
use crate::validation::{NewProvider, SUMMARY_MAX};

/// An admin's verdict on a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Reject { reason: Option<String> },
}

impl Decision {
    #[must_use]
    pub const fn target_status(&self) -> SubmissionStatus {
        match self {
            Self::Approve => SubmissionStatus::Approved,
            Self::Reject { .. } => SubmissionStatus::Rejected,
        }
    }

    /// Build a rejection, treating a blank reason as none.
    #[must_use]
    pub fn reject(reason: &str) -> Self {
        let reason = reason.trim();
        Self::Reject {
            reason: (!reason.is_empty()).then(|| reason.to_owned()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuleViolation {
    #[error("This submission was already {0}.")]
    AlreadyReviewed(SubmissionStatus),

    #[error(
        "Cannot delete: {0} provider(s) still use this category. Reassign them first."
    )]
    CategoryInUse(i64),
}

/// Check that `decision` may be applied to a submission currently in `current`.
///
/// # Errors
///
/// Returns [`RuleViolation::AlreadyReviewed`] for anything but a new submission.
pub fn apply_decision(
    current: SubmissionStatus,
    decision: &Decision,
) -> Result<SubmissionStatus, RuleViolation> {
    let next = decision.target_status();
    if current.can_transition_to(next) {
        Ok(next)
    } else {
        Err(RuleViolation::AlreadyReviewed(current))
    }
}

/// The provider created when `submission` is approved.
///
/// New providers start active, unfeatured and on the free tier. The summary
/// is the description cut to fit the card; the full text is kept as details.
#[must_use]
pub fn provider_from_submission(submission: &ListingSubmission) -> NewProvider {
    let summary: String = submission.description.chars().take(SUMMARY_MAX).collect();
    NewProvider {
        name: submission.company_name.clone(),
        category: submission.category.clone(),
        tags: Vec::new(),
        website: submission.website.clone(),
        summary,
        details: submission.description.clone(),
        discount: submission.discount.clone().map(|label| Discount {
            label,
            details: None,
        }),
        logo_url: None,
        is_active: true,
        is_featured: false,
        featured_until: None,
        tier: ProviderTier::Free,
    }
}

/// A category can only be deleted once no provider points at it.
///
/// # Errors
///
/// Returns [`RuleViolation::CategoryInUse`] with the number of referencing
/// providers.
pub const fn check_category_deletion(referencing_providers: i64) -> Result<(), RuleViolation> {
    if referencing_providers > 0 {
        Err(RuleViolation::CategoryInUse(referencing_providers))
    } else {
        Ok(())
    }
}
