//! Per-visitor state.
//!
//! Favorites, the compare set, queued drafts and form cooldowns all belong to
//! one browser, not to an account. They are kept as JSON values under fixed
//! keys in whatever implements [`ClientStore`]. In production that is the
//! visitor's `tower_sessions::Session`; tests use a map.

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tower_sessions::Session;

use appy_link_core::selection::{CompareSet, Favorites};
use appy_link_core::throttle::FormKind;
use appy_link_core::validation::{NewContactMessage, NewSubmission};

/// Fixed keys under which visitor state is stored.
pub mod keys {
    pub const FAVORITES: &str = "favorites";
    pub const COMPARE: &str = "compare";
    pub const DRAFT_SUBMISSIONS: &str = "draft_submissions";
    pub const DRAFT_MESSAGES: &str = "draft_messages";
}

/// Key holding the last successful submission time of `form`.
#[must_use]
pub fn rate_limit_key(form: FormKind) -> String {
    format!("rate_limit_{}", form.as_str())
}

#[derive(Debug, thiserror::Error)]
#[error("client store error: {0}")]
pub struct ClientStoreError(String);

impl ClientStoreError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Key/value storage scoped to one visitor.
pub trait ClientStore: Send + Sync {
    /// Read a value. Missing or undecodable values read as `None`.
    fn get_value<T>(&self, key: &str) -> impl Future<Output = Option<T>> + Send
    where
        T: DeserializeOwned + Send;

    fn set_value<T>(&self, key: &str, value: &T) -> impl Future<Output = Result<(), ClientStoreError>> + Send
    where
        T: Serialize + Sync;
}

impl ClientStore for Session {
    async fn get_value<T>(&self, key: &str) -> Option<T>
    where
        T: DeserializeOwned + Send,
    {
        self.get::<T>(key).await.ok().flatten()
    }

    async fn set_value<T>(&self, key: &str, value: &T) -> Result<(), ClientStoreError>
    where
        T: Serialize + Sync,
    {
        self.insert(key, value)
            .await
            .map_err(|e| ClientStoreError::new(e.to_string()))
    }
}

pub async fn favorites(store: &impl ClientStore) -> Favorites {
    store.get_value(keys::FAVORITES).await.unwrap_or_default()
}

pub async fn compare_set(store: &impl ClientStore) -> CompareSet {
    store.get_value(keys::COMPARE).await.unwrap_or_default()
}

pub async fn last_submitted(store: &impl ClientStore, form: FormKind) -> Option<DateTime<Utc>> {
    store.get_value(&rate_limit_key(form)).await
}

/// Start the cooldown for `form`.
///
/// # Errors
///
/// Returns `ClientStoreError` if the session cannot be written.
pub async fn record_submission(
    store: &impl ClientStore,
    form: FormKind,
    at: DateTime<Utc>,
) -> Result<(), ClientStoreError> {
    store.set_value(&rate_limit_key(form), &at).await
}

/// A listing submission accepted while no database was configured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, serde::Deserialize)]
pub struct DraftSubmission {
    #[serde(flatten)]
    pub submission: NewSubmission,
    pub queued_at: DateTime<Utc>,
}

/// A contact message accepted while no database was configured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, serde::Deserialize)]
pub struct DraftMessage {
    #[serde(flatten)]
    pub message: NewContactMessage,
    pub queued_at: DateTime<Utc>,
}

pub async fn draft_submissions(store: &impl ClientStore) -> Vec<DraftSubmission> {
    store
        .get_value(keys::DRAFT_SUBMISSIONS)
        .await
        .unwrap_or_default()
}

pub async fn draft_messages(store: &impl ClientStore) -> Vec<DraftMessage> {
    store.get_value(keys::DRAFT_MESSAGES).await.unwrap_or_default()
}

/// Append a submission to the visitor's draft queue.
///
/// # Errors
///
/// Returns `ClientStoreError` if the session cannot be written.
pub async fn queue_submission(
    store: &impl ClientStore,
    submission: NewSubmission,
    at: DateTime<Utc>,
) -> Result<(), ClientStoreError> {
    let mut drafts = draft_submissions(store).await;
    drafts.push(DraftSubmission {
        submission,
        queued_at: at,
    });
    store.set_value(keys::DRAFT_SUBMISSIONS, &drafts).await
}

/// Append a contact message to the visitor's draft queue.
///
/// # Errors
///
/// Returns `ClientStoreError` if the session cannot be written.
pub async fn queue_message(
    store: &impl ClientStore,
    message: NewContactMessage,
    at: DateTime<Utc>,
) -> Result<(), ClientStoreError> {
    let mut drafts = draft_messages(store).await;
    drafts.push(DraftMessage {
        message,
        queued_at: at,
    });
    store.set_value(keys::DRAFT_MESSAGES, &drafts).await
}

#[cfg(test)]
pub(crate) mod memory {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;

    /// In-memory `ClientStore` for unit tests.
    #[derive(Default)]
    pub struct MemoryClientStore {
        values: Mutex<HashMap<String, serde_json::Value>>,
    }

    impl MemoryClientStore {
        pub fn contains(&self, key: &str) -> bool {
            self.values
                .lock()
                .is_ok_and(|values| values.contains_key(key))
        }
    }

    impl ClientStore for MemoryClientStore {
        async fn get_value<T>(&self, key: &str) -> Option<T>
        where
            T: DeserializeOwned + Send,
        {
            let value = self.values.lock().ok()?.get(key).cloned()?;
            serde_json::from_value(value).ok()
        }

        async fn set_value<T>(&self, key: &str, value: &T) -> Result<(), ClientStoreError>
        where
            T: Serialize + Sync,
        {
            let value =
                serde_json::to_value(value).map_err(|e| ClientStoreError::new(e.to_string()))?;
            self.values
                .lock()
                .map_err(|e| ClientStoreError::new(e.to_string()))?
                .insert(key.to_owned(), value);
            Ok(())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use appy_link_core::ProviderId;

    use super::memory::MemoryClientStore;
    use super::*;

    #[tokio::test]
    async fn test_missing_values_read_as_defaults() {
        let store = MemoryClientStore::default();
        assert!(favorites(&store).await.is_empty());
        assert!(compare_set(&store).await.is_empty());
        assert!(last_submitted(&store, FormKind::Contact).await.is_none());
    }

    #[tokio::test]
    async fn test_selections_persist_under_fixed_keys() {
        let store = MemoryClientStore::default();
        let mut favs = favorites(&store).await;
        favs.toggle(ProviderId::new(3));
        store.set_value(keys::FAVORITES, &favs).await.unwrap();

        assert!(store.contains("favorites"));
        assert!(favorites(&store).await.contains(ProviderId::new(3)));
    }

    #[tokio::test]
    async fn test_cooldowns_are_per_form() {
        let store = MemoryClientStore::default();
        let now = Utc::now();
        record_submission(&store, FormKind::Submission, now)
            .await
            .unwrap();

        assert!(store.contains("rate_limit_submission"));
        assert_eq!(
            last_submitted(&store, FormKind::Submission).await,
            Some(now)
        );
        assert!(last_submitted(&store, FormKind::Contact).await.is_none());
    }
}
