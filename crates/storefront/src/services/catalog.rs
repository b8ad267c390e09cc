//! Directory snapshot service.
//!
//! Loads categories and active providers from `PostgreSQL` and caches them
//! with `moka` for 30 seconds, since every filter change re-reads the full
//! list. Without a database, or when the database fails, the built-in seed
//! directory is served instead and the page shows a "local data" notice.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use sqlx::PgPool;
use tracing::instrument;

use appy_link_core::catalog::{Category, Provider};
use appy_link_core::{CategorySlug, ProviderId, seed};

use crate::db::{DirectoryRepository, RepositoryError};

const SNAPSHOT_KEY: &str = "directory";
const SNAPSHOT_TTL: Duration = Duration::from_secs(30);

/// Where the listings on a page came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    Live,
    /// No database configured.
    Unconfigured,
    /// Database configured but the last load failed.
    Unavailable,
}

impl DataSource {
    /// Status line shown above the results.
    #[must_use]
    pub const fn notice(self) -> &'static str {
        match self {
            Self::Live => "Live data loaded",
            Self::Unconfigured => "Using local data (database not configured)",
            Self::Unavailable => "Using local data (database unavailable)",
        }
    }

    #[must_use]
    pub const fn is_live(self) -> bool {
        matches!(self, Self::Live)
    }
}

/// Categories and active providers at one point in time.
#[derive(Debug, Clone)]
pub struct DirectorySnapshot {
    pub categories: Vec<Category>,
    pub providers: Vec<Provider>,
    pub source: DataSource,
}

impl DirectorySnapshot {
    /// The built-in directory, tagged with why it is being served.
    #[must_use]
    pub fn seed(source: DataSource) -> Self {
        Self {
            categories: seed::categories(),
            providers: seed::providers(),
            source,
        }
    }

    /// Look up an active provider.
    #[must_use]
    pub fn provider(&self, id: ProviderId) -> Option<&Provider> {
        self.providers.iter().find(|p| p.id == id && p.is_active)
    }

    /// Active providers with the given ids, in the order given. Unknown or
    /// hidden ids are skipped.
    #[must_use]
    pub fn providers_by_ids(&self, ids: &[ProviderId]) -> Vec<&Provider> {
        ids.iter().filter_map(|&id| self.provider(id)).collect()
    }

    /// Display label for a category id, falling back to the id itself.
    #[must_use]
    pub fn category_label<'a>(&'a self, id: &'a CategorySlug) -> &'a str {
        self.categories
            .iter()
            .find(|c| &c.id == id)
            .map_or_else(|| id.as_str(), |c| c.label.as_str())
    }
}

/// Shared handle to the directory data.
#[derive(Clone)]
pub struct CatalogService {
    inner: Arc<CatalogServiceInner>,
}

struct CatalogServiceInner {
    pool: Option<PgPool>,
    cache: Cache<&'static str, Arc<DirectorySnapshot>>,
    unconfigured: Arc<DirectorySnapshot>,
}

impl CatalogService {
    /// Create the service. `None` serves the seed directory permanently.
    #[must_use]
    pub fn new(pool: Option<PgPool>) -> Self {
        let cache = Cache::builder()
            .max_capacity(1)
            .time_to_live(SNAPSHOT_TTL)
            .build();

        Self {
            inner: Arc::new(CatalogServiceInner {
                pool,
                cache,
                unconfigured: Arc::new(DirectorySnapshot::seed(DataSource::Unconfigured)),
            }),
        }
    }

    #[must_use]
    pub fn pool(&self) -> Option<&PgPool> {
        self.inner.pool.as_ref()
    }

    /// Current directory contents.
    ///
    /// Load failures are logged and answered with seed data. The fallback is
    /// not cached, so the next request retries the database.
    #[instrument(skip(self))]
    pub async fn snapshot(&self) -> Arc<DirectorySnapshot> {
        let Some(pool) = &self.inner.pool else {
            return Arc::clone(&self.inner.unconfigured);
        };

        if let Some(snapshot) = self.inner.cache.get(SNAPSHOT_KEY).await {
            return snapshot;
        }

        match load(pool).await {
            Ok(snapshot) => {
                let snapshot = Arc::new(snapshot);
                self.inner
                    .cache
                    .insert(SNAPSHOT_KEY, Arc::clone(&snapshot))
                    .await;
                snapshot
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to load directory, serving local data");
                Arc::new(DirectorySnapshot::seed(DataSource::Unavailable))
            }
        }
    }
}

async fn load(pool: &PgPool) -> Result<DirectorySnapshot, RepositoryError> {
    let repo = DirectoryRepository::new(pool);
    let categories = repo.list_categories().await?;
    let providers = repo.list_active_providers().await?;
    tracing::debug!(
        categories = categories.len(),
        providers = providers.len(),
        "Loaded directory"
    );

    Ok(DirectorySnapshot {
        categories,
        providers,
        source: DataSource::Live,
    })
}
