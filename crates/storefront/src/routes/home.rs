//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use chrono::Utc;
use tower_sessions::Session;
use tracing::instrument;

use appy_link_core::directory::{FilterState, filter_providers};

use super::views::{NavCounts, ProviderCard, SourceNotice};
use crate::filters;
use crate::services::client_store;
use crate::state::AppState;

/// Featured providers shown on the home page.
const HOME_FEATURED: usize = 6;

/// A category tile linking into the filtered listing.
#[derive(Debug, Clone)]
pub struct CategoryTile {
    pub id: String,
    pub label: String,
    pub count: usize,
}

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub nav: NavCounts,
    pub notice: SourceNotice,
    pub featured: Vec<ProviderCard>,
    pub categories: Vec<CategoryTile>,
    pub provider_count: usize,
}

/// Display the home page.
#[instrument(skip(state, session))]
pub async fn home(State(state): State<AppState>, session: Session) -> impl IntoResponse {
    let snapshot = state.catalog().snapshot().await;
    let favorites = client_store::favorites(&session).await;
    let compare = client_store::compare_set(&session).await;
    let now = Utc::now();

    // Default filter: every active provider, featured first.
    let listed = filter_providers(&snapshot.providers, &FilterState::default(), now);

    let featured = listed
        .iter()
        .filter(|p| p.is_featured_at(now))
        .take(HOME_FEATURED)
        .map(|p| ProviderCard::new(p, &snapshot, &favorites, &compare, now))
        .collect();

    let categories = snapshot
        .categories
        .iter()
        .map(|c| CategoryTile {
            id: c.id.as_str().to_owned(),
            label: c.label.clone(),
            count: listed.iter().filter(|p| p.category == c.id).count(),
        })
        .collect();

    HomeTemplate {
        nav: NavCounts::from_selection(&favorites, &compare),
        notice: snapshot.source.into(),
        featured,
        categories,
        provider_count: listed.len(),
    }
}
