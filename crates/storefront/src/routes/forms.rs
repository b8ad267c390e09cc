//! Listing submission and contact form handlers.
//!
//! Both forms re-render themselves on POST with inline field errors or a
//! notice, so they work without JavaScript. The hidden `company_website`
//! input is the honeypot.

use askama::Template;
use askama_web::WebTemplate;
use axum::{Form, extract::State, response::IntoResponse};
use chrono::Utc;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use appy_link_core::throttle::GuardOutcome;
use appy_link_core::validation::{ContactInput, FieldErrors, SubmissionInput};

use super::providers::CategoryOption;
use super::views::NavCounts;
use crate::db::DirectoryRepository;
use crate::filters;
use crate::services::FormOutcome;
use crate::services::forms::{submit_contact, submit_listing};
use crate::state::AppState;

/// Banner shown above a form after a POST.
#[derive(Debug, Clone)]
pub struct FormNotice {
    /// `success` or `error`, used as a CSS modifier.
    pub kind: &'static str,
    pub text: String,
}

impl FormNotice {
    fn success(text: impl Into<String>) -> Self {
        Self {
            kind: "success",
            text: text.into(),
        }
    }

    fn error(text: impl Into<String>) -> Self {
        Self {
            kind: "error",
            text: text.into(),
        }
    }
}

/// Banner for a pipeline outcome, with the wording for each kind of success.
fn notice_for(outcome: &FormOutcome, saved: &str, queued: &str) -> Option<FormNotice> {
    match outcome {
        FormOutcome::Saved => Some(FormNotice::success(saved)),
        FormOutcome::Queued => Some(FormNotice::success(queued)),
        FormOutcome::Dropped => None,
        FormOutcome::Throttled { remaining_secs } => GuardOutcome::Throttled {
            remaining_secs: *remaining_secs,
        }
        .message()
        .map(FormNotice::error),
        FormOutcome::Invalid(_) => Some(FormNotice::error("Please fix the errors below.")),
        FormOutcome::Failed(message) => Some(FormNotice::error(message.clone())),
    }
}

// =============================================================================
// Listing submission
// =============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct SubmissionForm {
    #[serde(flatten)]
    pub input: SubmissionInput,
    #[serde(default)]
    pub company_website: Option<String>,
}

/// "List your business" page template.
#[derive(Template, WebTemplate)]
#[template(path = "submit.html")]
pub struct SubmitTemplate {
    pub nav: NavCounts,
    pub categories: Vec<CategoryOption>,
    pub values: SubmissionInput,
    pub errors: FieldErrors,
    pub notice: Option<FormNotice>,
}

async fn render_submit(
    state: &AppState,
    session: &Session,
    values: SubmissionInput,
    errors: FieldErrors,
    notice: Option<FormNotice>,
) -> SubmitTemplate {
    let snapshot = state.catalog().snapshot().await;
    let categories = snapshot
        .categories
        .iter()
        .map(|c| CategoryOption {
            id: c.id.as_str().to_owned(),
            label: c.label.clone(),
            selected: c.id.as_str() == values.category,
        })
        .collect();

    SubmitTemplate {
        nav: NavCounts::load(session).await,
        categories,
        values,
        errors,
        notice,
    }
}

/// Display the submission form.
#[instrument(skip(state, session))]
pub async fn submit_page(State(state): State<AppState>, session: Session) -> impl IntoResponse {
    render_submit(
        &state,
        &session,
        SubmissionInput::default(),
        FieldErrors::new(),
        None,
    )
    .await
}

/// Handle a listing submission.
#[instrument(skip(state, session, form))]
pub async fn submit(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<SubmissionForm>,
) -> impl IntoResponse {
    let snapshot = state.catalog().snapshot().await;
    let repo = state.pool().map(DirectoryRepository::new);

    let outcome = submit_listing(
        &session,
        repo.as_ref(),
        state.cooldown(),
        &snapshot.categories,
        &form.input,
        form.company_website.as_deref(),
        Utc::now(),
    )
    .await;

    let notice = notice_for(
        &outcome,
        "Thanks! Your listing has been submitted for review.",
        "Thanks! Your listing has been saved as a draft on this device.",
    );
    let errors = outcome.field_errors().cloned().unwrap_or_default();
    let values = if outcome.clears_form() {
        SubmissionInput::default()
    } else {
        form.input
    };

    render_submit(&state, &session, values, errors, notice).await
}

// =============================================================================
// Contact
// =============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct ContactForm {
    #[serde(flatten)]
    pub input: ContactInput,
    #[serde(default)]
    pub company_website: Option<String>,
}

/// Contact page template.
#[derive(Template, WebTemplate)]
#[template(path = "contact.html")]
pub struct ContactTemplate {
    pub nav: NavCounts,
    pub values: ContactInput,
    pub errors: FieldErrors,
    pub notice: Option<FormNotice>,
}

/// Display the contact form.
#[instrument(skip(session))]
pub async fn contact_page(session: Session) -> impl IntoResponse {
    ContactTemplate {
        nav: NavCounts::load(&session).await,
        values: ContactInput::default(),
        errors: FieldErrors::new(),
        notice: None,
    }
}

/// Handle a contact message.
#[instrument(skip(state, session, form))]
pub async fn contact(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<ContactForm>,
) -> impl IntoResponse {
    let repo = state.pool().map(DirectoryRepository::new);

    let outcome = submit_contact(
        &session,
        repo.as_ref(),
        state.cooldown(),
        &form.input,
        form.company_website.as_deref(),
        Utc::now(),
    )
    .await;

    let notice = notice_for(
        &outcome,
        "Thanks! Your message has been sent. We'll be in touch soon.",
        "Thanks! Your message has been saved as a draft on this device.",
    );
    let errors = outcome.field_errors().cloned().unwrap_or_default();
    let values = if outcome.clears_form() {
        ContactInput::default()
    } else {
        form.input
    };

    ContactTemplate {
        nav: NavCounts::load(&session).await,
        values,
        errors,
        notice,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notice_for_outcomes() {
        let saved = notice_for(&FormOutcome::Saved, "saved", "queued");
        assert!(saved.is_some_and(|n| n.kind == "success" && n.text == "saved"));

        assert!(notice_for(&FormOutcome::Dropped, "saved", "queued").is_none());

        let throttled = notice_for(
            &FormOutcome::Throttled { remaining_secs: 12 },
            "saved",
            "queued",
        );
        assert!(throttled.is_some_and(|n| n.kind == "error" && n.text.contains("12 seconds")));
    }
}
