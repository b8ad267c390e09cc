//! Favorites and compare pages.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::State,
    http::HeaderMap,
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use chrono::Utc;
use tower_sessions::Session;
use tracing::instrument;

use appy_link_core::selection::CompareSet;

use super::views::{NavCounts, ProviderCard, ProviderDetail, is_htmx};
use crate::error::Result;
use crate::filters;
use crate::services::client_store::{self, ClientStore, keys};
use crate::state::AppState;

/// Saved providers page template.
#[derive(Template, WebTemplate)]
#[template(path = "favorites.html")]
pub struct FavoritesTemplate {
    pub nav: NavCounts,
    pub cards: Vec<ProviderCard>,
}

/// Side-by-side comparison page template.
#[derive(Template, WebTemplate)]
#[template(path = "compare.html")]
pub struct CompareTemplate {
    pub nav: NavCounts,
    pub providers: Vec<ProviderDetail>,
}

/// Header counts fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/nav_counts.html")]
pub struct NavCountsTemplate {
    pub nav: NavCounts,
}

/// Display saved providers.
///
/// Ids that no longer resolve (hidden or deleted providers) are skipped.
#[instrument(skip(state, session))]
pub async fn favorites(State(state): State<AppState>, session: Session) -> impl IntoResponse {
    let snapshot = state.catalog().snapshot().await;
    let favorites = client_store::favorites(&session).await;
    let compare = client_store::compare_set(&session).await;
    let now = Utc::now();

    let cards = snapshot
        .providers_by_ids(favorites.ids())
        .into_iter()
        .map(|p| ProviderCard::new(p, &snapshot, &favorites, &compare, now))
        .collect();

    FavoritesTemplate {
        nav: NavCounts::from_selection(&favorites, &compare),
        cards,
    }
}

/// Display the compare table.
#[instrument(skip(state, session))]
pub async fn compare(State(state): State<AppState>, session: Session) -> impl IntoResponse {
    let snapshot = state.catalog().snapshot().await;
    let favorites = client_store::favorites(&session).await;
    let compare = client_store::compare_set(&session).await;
    let now = Utc::now();

    let providers = snapshot
        .providers_by_ids(compare.ids())
        .into_iter()
        .map(|p| ProviderDetail::new(p, &snapshot, &favorites, &compare, now))
        .collect();

    CompareTemplate {
        nav: NavCounts::from_selection(&favorites, &compare),
        providers,
    }
}

/// Empty the compare tray.
#[instrument(skip(session, headers))]
pub async fn clear_compare(session: Session, headers: HeaderMap) -> Result<Response> {
    session
        .set_value(keys::COMPARE, &CompareSet::default())
        .await?;

    if is_htmx(&headers) {
        return Ok((AppendHeaders([("HX-Redirect", "/compare")]), "").into_response());
    }
    Ok(Redirect::to("/compare").into_response())
}

/// Header counts (HTMX), refreshed on `selection-updated`.
#[instrument(skip(session))]
pub async fn nav_counts(session: Session) -> impl IntoResponse {
    let nav = NavCounts::load(&session).await;
    (
        AppendHeaders([("Cache-Control", "no-store")]),
        NavCountsTemplate { nav },
    )
}
