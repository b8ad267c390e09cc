//! Dashboard route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use tower_sessions::Session;
use tracing::instrument;

use super::views::PageChrome;
use crate::db::{CatalogRepository, MessageRepository, SubmissionRepository};
use crate::error::Result;
use crate::filters;
use crate::middleware::RequireView;
use crate::state::AppState;

/// Counts shown on the dashboard cards.
#[derive(Debug, Clone, Default)]
pub struct DashboardMetrics {
    pub pending_submissions: i64,
    pub active_providers: i64,
    pub hidden_providers: i64,
    pub categories: usize,
    pub messages: i64,
}

/// Dashboard page template.
#[derive(Template, WebTemplate)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub chrome: PageChrome,
    pub metrics: DashboardMetrics,
}

/// Dashboard overview.
///
/// GET /
#[instrument(skip_all)]
pub async fn index(
    RequireView(admin): RequireView,
    State(state): State<AppState>,
    session: Session,
) -> Result<DashboardTemplate> {
    let pool = state.pool();
    let catalog = CatalogRepository::new(pool);

    let (active_providers, hidden_providers) = catalog.provider_counts().await?;
    let metrics = DashboardMetrics {
        pending_submissions: SubmissionRepository::new(pool).count_pending().await?,
        active_providers,
        hidden_providers,
        categories: catalog.list_categories().await?.len(),
        messages: MessageRepository::new(pool).count().await?,
    };

    Ok(DashboardTemplate {
        chrome: PageChrome::load(&session, &admin, "/").await,
        metrics,
    })
}
