//! Submission review handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::Redirect,
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use appy_link_core::catalog::{Category, ListingSubmission};
use appy_link_core::{SubmissionId, SubmissionStatus};

use super::views::{PageChrome, format_datetime};
use crate::db::{CatalogRepository, SubmissionRepository};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{RequireModerator, RequireView, set_flash};
use crate::models::Flash;
use crate::services::ModerationError;
use crate::state::AppState;

/// Submissions shown per page load.
const LIST_LIMIT: i64 = 200;

/// Status tabs, in display order. `all` shows every status.
const TABS: [&str; 4] = ["new", "approved", "rejected", "all"];

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SubmissionsQuery {
    pub status: String,
}

impl SubmissionsQuery {
    /// The selected tab, defaulting to the review queue.
    fn tab(&self) -> &str {
        TABS.iter()
            .find(|t| **t == self.status)
            .copied()
            .unwrap_or("new")
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ReviewForm {
    pub reason: String,
    /// Tab to return to.
    pub status: String,
}

#[derive(Debug, Clone)]
pub struct TabView {
    pub key: &'static str,
    pub selected: bool,
}

#[derive(Debug, Clone)]
pub struct SubmissionView {
    pub id: i32,
    pub company_name: String,
    pub category: String,
    pub website: String,
    pub description: String,
    pub discount: String,
    pub status: &'static str,
    pub is_pending: bool,
    pub submitted: String,
    pub reviewed: String,
    pub rejection_reason: String,
    pub provider_id: Option<i32>,
}

impl SubmissionView {
    fn new(submission: ListingSubmission, categories: &[Category]) -> Self {
        let category = categories
            .iter()
            .find(|c| c.id == submission.category)
            .map_or_else(|| submission.category.to_string(), |c| c.label.clone());

        Self {
            id: submission.id.as_i32(),
            company_name: submission.company_name,
            category,
            website: submission.website.unwrap_or_default(),
            description: submission.description,
            discount: submission.discount.unwrap_or_default(),
            status: submission.status.as_str(),
            is_pending: !submission.status.is_reviewed(),
            submitted: format_datetime(&submission.created_at),
            reviewed: submission
                .reviewed_at
                .as_ref()
                .map(format_datetime)
                .unwrap_or_default(),
            rejection_reason: submission.rejection_reason.unwrap_or_default(),
            provider_id: submission.provider_id.map(|id| id.as_i32()),
        }
    }
}

/// Submissions page template.
#[derive(Template, WebTemplate)]
#[template(path = "submissions.html")]
pub struct SubmissionsTemplate {
    pub chrome: PageChrome,
    pub tabs: Vec<TabView>,
    pub tab: String,
    pub submissions: Vec<SubmissionView>,
}

/// List submissions for one status tab.
///
/// GET /submissions?status=new|approved|rejected|all
#[instrument(skip_all)]
pub async fn index(
    RequireView(admin): RequireView,
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<SubmissionsQuery>,
) -> Result<SubmissionsTemplate> {
    let tab = query.tab();
    let status = match tab {
        "all" => None,
        other => Some(
            other
                .parse::<SubmissionStatus>()
                .map_err(|e| AppError::BadRequest(e.to_string()))?,
        ),
    };

    let categories = CatalogRepository::new(state.pool()).list_categories().await?;
    let submissions = SubmissionRepository::new(state.pool())
        .list(status, LIST_LIMIT)
        .await?
        .into_iter()
        .map(|s| SubmissionView::new(s, &categories))
        .collect();

    Ok(SubmissionsTemplate {
        chrome: PageChrome::load(&session, &admin, "/submissions").await,
        tabs: TABS
            .iter()
            .map(|&key| TabView {
                key,
                selected: key == tab,
            })
            .collect(),
        tab: tab.to_string(),
        submissions,
    })
}

/// Flash for a failed review. Expected refusals are shown; faults propagate.
fn review_failure(err: ModerationError) -> Result<Flash> {
    match err {
        ModerationError::Repository(e) => Err(AppError::Database(e)),
        ModerationError::NotFound => Ok(Flash::error("That submission no longer exists.")),
        other => Ok(Flash::error(other.to_string())),
    }
}

fn back_to(form: &ReviewForm) -> Redirect {
    let query = SubmissionsQuery {
        status: form.status.clone(),
    };
    Redirect::to(&format!("/submissions?status={}", query.tab()))
}

/// Approve a submission into a new, visible provider.
///
/// POST /submissions/{id}/approve
#[instrument(skip(admin, state, session, form))]
pub async fn approve(
    RequireModerator(admin): RequireModerator,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
    Form(form): Form<ReviewForm>,
) -> Result<Redirect> {
    let flash = match state
        .moderation()
        .approve(SubmissionId::new(id), admin.id)
        .await
    {
        Ok(provider_id) => Flash::success(format!(
            "Submission approved. Provider #{provider_id} is now listed."
        )),
        Err(err) => review_failure(err)?,
    };

    set_flash(&session, flash).await?;
    Ok(back_to(&form))
}

/// Reject a submission with an optional reason.
///
/// POST /submissions/{id}/reject
#[instrument(skip(admin, state, session, form))]
pub async fn reject(
    RequireModerator(admin): RequireModerator,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
    Form(form): Form<ReviewForm>,
) -> Result<Redirect> {
    let flash = match state
        .moderation()
        .reject(SubmissionId::new(id), admin.id, &form.reason)
        .await
    {
        Ok(()) => Flash::success("Submission rejected."),
        Err(err) => review_failure(err)?,
    };

    set_flash(&session, flash).await?;
    Ok(back_to(&form))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_tab_defaults_to_review_queue() {
        let query = |s: &str| SubmissionsQuery {
            status: s.to_string(),
        };
        assert_eq!(query("").tab(), "new");
        assert_eq!(query("bogus").tab(), "new");
        assert_eq!(query("rejected").tab(), "rejected");
        assert_eq!(query("all").tab(), "all");
    }

    #[test]
    fn test_review_failure_messages() {
        let flash = review_failure(ModerationError::NotFound).unwrap();
        assert_eq!(flash.text, "That submission no longer exists.");

        let flash = review_failure(ModerationError::UnknownCategory("vans".to_string())).unwrap();
        assert_eq!(
            flash.text,
            "Category \"vans\" no longer exists. Recreate the category first."
        );
    }
}
