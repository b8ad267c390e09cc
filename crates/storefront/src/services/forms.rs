//! Listing submission and contact form pipeline.
//!
//! Each submission runs: honeypot, cooldown, validation, then either an
//! insert into the database or, in seed mode, a draft queued in the
//! visitor's session. The cooldown only starts after a successful save.

use std::future::Future;

use chrono::{DateTime, Utc};
use tracing::instrument;

use appy_link_core::catalog::Category;
use appy_link_core::throttle::{Cooldown, FormKind, GuardOutcome};
use appy_link_core::validation::{
    ContactInput, FieldErrors, NewContactMessage, NewSubmission, SubmissionInput,
    validate_contact, validate_submission,
};

use super::client_store::{self, ClientStore};
use crate::db::{DirectoryRepository, RepositoryError};

/// Persistent destination for accepted forms.
pub trait SubmissionSink: Send + Sync {
    fn save_submission(
        &self,
        submission: &NewSubmission,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    fn save_message(
        &self,
        message: &NewContactMessage,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;
}

impl SubmissionSink for DirectoryRepository<'_> {
    async fn save_submission(&self, submission: &NewSubmission) -> Result<(), RepositoryError> {
        let id = self.insert_submission(submission).await?;
        tracing::info!(submission_id = %id, company = %submission.company_name, "Listing submitted");
        Ok(())
    }

    async fn save_message(&self, message: &NewContactMessage) -> Result<(), RepositoryError> {
        let id = self.insert_contact_message(message).await?;
        tracing::info!(message_id = %id, "Contact message received");
        Ok(())
    }
}

/// Result of one form submission, as shown to the visitor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormOutcome {
    /// Stored in the database.
    Saved,
    /// Stored as a draft in the visitor's session (seed mode).
    Queued,
    /// Honeypot tripped. Render the blank form with no message.
    Dropped,
    Throttled { remaining_secs: i64 },
    Invalid(FieldErrors),
    Failed(String),
}

impl FormOutcome {
    /// Whether the form fields should be cleared on re-render.
    #[must_use]
    pub const fn clears_form(&self) -> bool {
        matches!(self, Self::Saved | Self::Queued | Self::Dropped)
    }

    #[must_use]
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            Self::Invalid(errors) => Some(errors),
            _ => None,
        }
    }
}

fn failure_message(kind: FormKind, err: &RepositoryError) -> String {
    let what = match kind {
        FormKind::Submission => "your listing",
        FormKind::Contact => "your message",
    };
    match err {
        RepositoryError::Database(sqlx::Error::PoolTimedOut | sqlx::Error::Io(_)) => {
            format!("We couldn't reach the directory to save {what}. Please try again shortly.")
        }
        RepositoryError::Database(_) | RepositoryError::DataCorruption(_) => {
            format!("Something went wrong saving {what}. Please try again.")
        }
    }
}

/// Shared guard step. `Some` short-circuits the pipeline.
async fn guard(
    store: &impl ClientStore,
    kind: FormKind,
    cooldown: Cooldown,
    honeypot: Option<&str>,
    now: DateTime<Utc>,
) -> Option<FormOutcome> {
    let last = client_store::last_submitted(store, kind).await;
    match cooldown.check(honeypot, last, now) {
        GuardOutcome::Proceed => None,
        GuardOutcome::DropSilently => {
            tracing::info!(form = kind.as_str(), "Honeypot tripped, dropping submission");
            Some(FormOutcome::Dropped)
        }
        GuardOutcome::Throttled { remaining_secs } => {
            Some(FormOutcome::Throttled { remaining_secs })
        }
    }
}

async fn start_cooldown(store: &impl ClientStore, kind: FormKind, now: DateTime<Utc>) {
    if let Err(e) = client_store::record_submission(store, kind, now).await {
        tracing::warn!(form = kind.as_str(), error = %e, "Failed to record cooldown");
    }
}

/// Run the listing submission pipeline.
///
/// `sink` is `None` in seed mode.
#[instrument(skip_all, fields(company = %input.company_name))]
pub async fn submit_listing<S, K>(
    store: &S,
    sink: Option<&K>,
    cooldown: Cooldown,
    categories: &[Category],
    input: &SubmissionInput,
    honeypot: Option<&str>,
    now: DateTime<Utc>,
) -> FormOutcome
where
    S: ClientStore,
    K: SubmissionSink,
{
    if let Some(outcome) = guard(store, FormKind::Submission, cooldown, honeypot, now).await {
        return outcome;
    }

    let submission = match validate_submission(input, categories) {
        Ok(submission) => submission,
        Err(errors) => return FormOutcome::Invalid(errors),
    };

    let outcome = match sink {
        Some(sink) => match sink.save_submission(&submission).await {
            Ok(()) => FormOutcome::Saved,
            Err(e) => {
                tracing::error!(error = %e, "Failed to store listing submission");
                return FormOutcome::Failed(failure_message(FormKind::Submission, &e));
            }
        },
        None => match client_store::queue_submission(store, submission, now).await {
            Ok(()) => FormOutcome::Queued,
            Err(e) => {
                tracing::error!(error = %e, "Failed to queue draft submission");
                return FormOutcome::Failed(
                    "Something went wrong saving your listing. Please try again.".to_owned(),
                );
            }
        },
    };

    start_cooldown(store, FormKind::Submission, now).await;
    outcome
}

/// Run the contact form pipeline.
///
/// `sink` is `None` in seed mode.
#[instrument(skip_all)]
pub async fn submit_contact<S, K>(
    store: &S,
    sink: Option<&K>,
    cooldown: Cooldown,
    input: &ContactInput,
    honeypot: Option<&str>,
    now: DateTime<Utc>,
) -> FormOutcome
where
    S: ClientStore,
    K: SubmissionSink,
{
    if let Some(outcome) = guard(store, FormKind::Contact, cooldown, honeypot, now).await {
        return outcome;
    }

    let message = match validate_contact(input) {
        Ok(message) => message,
        Err(errors) => return FormOutcome::Invalid(errors),
    };

    let outcome = match sink {
        Some(sink) => match sink.save_message(&message).await {
            Ok(()) => FormOutcome::Saved,
            Err(e) => {
                tracing::error!(error = %e, "Failed to store contact message");
                return FormOutcome::Failed(failure_message(FormKind::Contact, &e));
            }
        },
        None => match client_store::queue_message(store, message, now).await {
            Ok(()) => FormOutcome::Queued,
            Err(e) => {
                tracing::error!(error = %e, "Failed to queue draft message");
                return FormOutcome::Failed(
                    "Something went wrong saving your message. Please try again.".to_owned(),
                );
            }
        },
    };

    start_cooldown(store, FormKind::Contact, now).await;
    outcome
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use chrono::Duration;

    use appy_link_core::seed;

    use super::*;
    use crate::services::client_store::memory::MemoryClientStore;

    /// Records calls; optionally fails every save.
    #[derive(Default)]
    struct RecordingSink {
        submissions: Mutex<Vec<NewSubmission>>,
        messages: Mutex<Vec<NewContactMessage>>,
        fail: bool,
    }

    impl RecordingSink {
        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        fn calls(&self) -> usize {
            self.submissions.lock().unwrap().len() + self.messages.lock().unwrap().len()
        }
    }

    impl SubmissionSink for RecordingSink {
        async fn save_submission(&self, submission: &NewSubmission) -> Result<(), RepositoryError> {
            if self.fail {
                return Err(RepositoryError::Database(sqlx::Error::PoolTimedOut));
            }
            self.submissions.lock().unwrap().push(submission.clone());
            Ok(())
        }

        async fn save_message(&self, message: &NewContactMessage) -> Result<(), RepositoryError> {
            if self.fail {
                return Err(RepositoryError::Database(sqlx::Error::RowNotFound));
            }
            self.messages.lock().unwrap().push(message.clone());
            Ok(())
        }
    }

    fn listing() -> SubmissionInput {
        SubmissionInput {
            company_name: "Pack Right Boxes".to_owned(),
            category: "equipment".to_owned(),
            website: "https://packright.example".to_owned(),
            description: "Double-wall removal boxes delivered next day.".to_owned(),
            discount: String::new(),
        }
    }

    fn contact() -> ContactInput {
        ContactInput {
            name: "Sam".to_owned(),
            email: "sam@movers.example".to_owned(),
            message: "Do you list man-and-van firms too?".to_owned(),
        }
    }

    #[tokio::test]
    async fn test_listing_saved_and_cooldown_started() {
        let store = MemoryClientStore::default();
        let sink = RecordingSink::default();
        let now = Utc::now();

        let outcome = submit_listing(
            &store,
            Some(&sink),
            Cooldown::default(),
            &seed::categories(),
            &listing(),
            None,
            now,
        )
        .await;

        assert_eq!(outcome, FormOutcome::Saved);
        assert_eq!(sink.calls(), 1);
        assert!(store.contains("rate_limit_submission"));
    }

    #[tokio::test]
    async fn test_honeypot_drops_without_store_call() {
        let store = MemoryClientStore::default();
        let sink = RecordingSink::default();

        let outcome = submit_listing(
            &store,
            Some(&sink),
            Cooldown::default(),
            &seed::categories(),
            &listing(),
            Some("http://spam.example"),
            Utc::now(),
        )
        .await;

        assert_eq!(outcome, FormOutcome::Dropped);
        assert!(outcome.field_errors().is_none());
        assert_eq!(sink.calls(), 0);
        assert!(!store.contains("rate_limit_submission"));
        assert!(!store.contains("draft_submissions"));
    }

    #[tokio::test]
    async fn test_second_attempt_inside_window_is_throttled() {
        let store = MemoryClientStore::default();
        let sink = RecordingSink::default();
        let first = Utc::now();

        let outcome =
            submit_contact(&store, Some(&sink), Cooldown::default(), &contact(), None, first).await;
        assert_eq!(outcome, FormOutcome::Saved);

        let outcome = submit_contact(
            &store,
            Some(&sink),
            Cooldown::default(),
            &contact(),
            None,
            first + Duration::seconds(5),
        )
        .await;
        assert_eq!(outcome, FormOutcome::Throttled { remaining_secs: 25 });
        assert_eq!(sink.calls(), 1);

        let outcome = submit_contact(
            &store,
            Some(&sink),
            Cooldown::default(),
            &contact(),
            None,
            first + Duration::seconds(31),
        )
        .await;
        assert_eq!(outcome, FormOutcome::Saved);
        assert_eq!(sink.calls(), 2);
    }

    #[tokio::test]
    async fn test_invalid_input_does_not_start_cooldown() {
        let store = MemoryClientStore::default();
        let sink = RecordingSink::default();
        let input = SubmissionInput {
            company_name: "A".to_owned(),
            ..listing()
        };

        let outcome = submit_listing(
            &store,
            Some(&sink),
            Cooldown::default(),
            &seed::categories(),
            &input,
            None,
            Utc::now(),
        )
        .await;

        assert!(
            outcome
                .field_errors()
                .is_some_and(|errors| errors.has("company_name"))
        );
        assert_eq!(sink.calls(), 0);
        assert!(!store.contains("rate_limit_submission"));
    }

    #[tokio::test]
    async fn test_seed_mode_queues_drafts() {
        let store = MemoryClientStore::default();
        let now = Utc::now();

        let outcome = submit_contact::<_, RecordingSink>(
            &store,
            None,
            Cooldown::default(),
            &contact(),
            None,
            now,
        )
        .await;

        assert_eq!(outcome, FormOutcome::Queued);
        let drafts = client_store::draft_messages(&store).await;
        assert_eq!(drafts.len(), 1);
        assert_eq!(
            drafts.first().map(|d| d.message.email.as_str()),
            Some("sam@movers.example")
        );
    }

    #[tokio::test]
    async fn test_store_failure_is_reported() {
        let store = MemoryClientStore::default();
        let sink = RecordingSink::failing();

        let outcome = submit_listing(
            &store,
            Some(&sink),
            Cooldown::default(),
            &seed::categories(),
            &listing(),
            None,
            Utc::now(),
        )
        .await;

        let FormOutcome::Failed(message) = outcome else {
            panic!("expected failure, got {outcome:?}");
        };
        assert!(message.contains("try again"));
        assert!(!store.contains("rate_limit_submission"));
    }
}
