//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use appy_link_core::throttle::Cooldown;

use crate::config::StorefrontConfig;
use crate::services::CatalogService;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    catalog: CatalogService,
    cooldown: Cooldown,
}

impl AppState {
    /// Create a new application state.
    ///
    /// `pool` is `None` in seed mode.
    #[must_use]
    pub fn new(config: StorefrontConfig, pool: Option<PgPool>) -> Self {
        let cooldown = Cooldown::from_secs(config.form_cooldown_secs);
        Self {
            inner: Arc::new(AppStateInner {
                config,
                catalog: CatalogService::new(pool),
                cooldown,
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Database pool, if one is configured.
    #[must_use]
    pub fn pool(&self) -> Option<&PgPool> {
        self.inner.catalog.pool()
    }

    #[must_use]
    pub fn catalog(&self) -> &CatalogService {
        &self.inner.catalog
    }

    #[must_use]
    pub fn cooldown(&self) -> Cooldown {
        self.inner.cooldown
    }
}
