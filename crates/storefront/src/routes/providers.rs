//! Directory browsing: filtered listing, provider profile and the
//! favorite/compare toggles.
//!
//! The filter form re-submits through HTMX on change (search input debounced
//! by 300 ms) and only the results fragment is swapped. Without JavaScript
//! the same form works as a plain GET.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, RawQuery, State},
    http::HeaderMap,
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use chrono::Utc;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use appy_link_core::ProviderId;
use appy_link_core::directory::{FilterState, SortMode, all_tags, filter_providers, paginate};
use appy_link_core::selection::CompareOutcome;

use super::views::{NavCounts, ProviderCard, ProviderDetail, SelectionState, SourceNotice, is_htmx};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::services::DirectorySnapshot;
use crate::services::client_store::{self, ClientStore, keys};
use crate::state::AppState;

/// HTMX event fired after favorites or compare change.
pub const SELECTION_UPDATED: &str = "selection-updated";

#[derive(Debug, Clone)]
pub struct CategoryOption {
    pub id: String,
    pub label: String,
    pub selected: bool,
}

#[derive(Debug, Clone)]
pub struct SortOption {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

#[derive(Debug, Clone)]
pub struct TagOption {
    pub name: String,
    pub checked: bool,
    /// Listing query with this tag toggled, for the chip links.
    pub toggle_query: String,
}

/// Current filter form state.
#[derive(Debug, Clone)]
pub struct FilterView {
    pub query: String,
    pub categories: Vec<CategoryOption>,
    pub sorts: Vec<SortOption>,
    pub tags: Vec<TagOption>,
    pub discount_only: bool,
}

impl FilterView {
    fn new(filter: &FilterState, snapshot: &DirectorySnapshot) -> Self {
        Self {
            query: filter.query.clone(),
            categories: snapshot
                .categories
                .iter()
                .map(|c| CategoryOption {
                    id: c.id.as_str().to_owned(),
                    label: c.label.clone(),
                    selected: filter.is_category(c.id.as_str()),
                })
                .collect(),
            sorts: SortMode::ALL
                .iter()
                .map(|&mode| SortOption {
                    value: mode.as_str(),
                    label: mode.label(),
                    selected: filter.sort == mode,
                })
                .collect(),
            tags: all_tags(&snapshot.providers)
                .into_iter()
                .map(|name| TagOption {
                    checked: filter.has_tag(&name),
                    toggle_query: filter.toggle_tag_query(&name),
                    name,
                })
                .collect(),
            discount_only: filter.discount_only,
        }
    }
}

/// One page of filtered results.
#[derive(Debug, Clone)]
pub struct ResultsView {
    pub notice: SourceNotice,
    pub cards: Vec<ProviderCard>,
    pub shown: usize,
    pub total: usize,
    pub remaining: usize,
    /// Query string for "Load more", if anything is left.
    pub next_query: Option<String>,
}

/// Provider listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "providers/index.html")]
pub struct ProvidersIndexTemplate {
    pub nav: NavCounts,
    pub filter: FilterView,
    pub results: ResultsView,
}

/// Results fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/results.html")]
pub struct ResultsTemplate {
    pub results: ResultsView,
}

/// Provider profile page template.
#[derive(Template, WebTemplate)]
#[template(path = "providers/show.html")]
pub struct ProviderShowTemplate {
    pub nav: NavCounts,
    pub provider: ProviderDetail,
    pub notice: SourceNotice,
}

/// Favorite/compare buttons fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/selection_actions.html")]
pub struct SelectionActionsTemplate {
    pub selection: SelectionState,
    /// Inline notice next to the buttons; empty for none.
    pub message: &'static str,
}

/// Display the filtered directory.
///
/// HTMX requests get just the results fragment.
#[instrument(skip(state, session, headers))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> Response {
    let filter = FilterState::from_query(query.as_deref().unwrap_or_default());
    let snapshot = state.catalog().snapshot().await;
    let favorites = client_store::favorites(&session).await;
    let compare = client_store::compare_set(&session).await;
    let now = Utc::now();

    let page = paginate(
        filter_providers(&snapshot.providers, &filter, now),
        filter.limit,
    );
    let results = ResultsView {
        notice: snapshot.source.into(),
        cards: page
            .items
            .iter()
            .map(|p| ProviderCard::new(p, &snapshot, &favorites, &compare, now))
            .collect(),
        shown: page.shown,
        total: page.total,
        remaining: page.remaining,
        next_query: page.has_more().then(|| filter.next_page_query()),
    };

    if is_htmx(&headers) {
        return ResultsTemplate { results }.into_response();
    }

    ProvidersIndexTemplate {
        nav: NavCounts::from_selection(&favorites, &compare),
        filter: FilterView::new(&filter, &snapshot),
        results,
    }
    .into_response()
}

/// Display a provider profile.
#[instrument(skip(state, session))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse> {
    let id = ProviderId::new(id);
    let snapshot = state.catalog().snapshot().await;
    let provider = snapshot
        .provider(id)
        .ok_or(AppError::ProviderNotFound(id))?;
    let favorites = client_store::favorites(&session).await;
    let compare = client_store::compare_set(&session).await;

    Ok(ProviderShowTemplate {
        nav: NavCounts::from_selection(&favorites, &compare),
        provider: ProviderDetail::new(provider, &snapshot, &favorites, &compare, Utc::now()),
        notice: snapshot.source.into(),
    })
}

/// Where to send non-HTMX form posts afterwards.
#[derive(Debug, Default, Deserialize)]
pub struct ReturnTo {
    #[serde(default)]
    pub return_to: String,
}

impl ReturnTo {
    /// A local path to go back to, or `fallback`. Absolute and
    /// protocol-relative URLs are ignored.
    #[must_use]
    pub fn target(&self, fallback: &str) -> String {
        let path = self.return_to.trim();
        if path.starts_with('/') && !path.starts_with("//") {
            path.to_owned()
        } else {
            fallback.to_owned()
        }
    }
}

fn require_provider(snapshot: &DirectorySnapshot, id: i32) -> Result<ProviderId> {
    let id = ProviderId::new(id);
    snapshot
        .provider(id)
        .map(|p| p.id)
        .ok_or(AppError::ProviderNotFound(id))
}

async fn selection_response(
    session: &Session,
    snapshot: &DirectorySnapshot,
    id: ProviderId,
    headers: &HeaderMap,
    back: &ReturnTo,
    message: &'static str,
) -> Result<Response> {
    if !is_htmx(headers) {
        return Ok(Redirect::to(&back.target(&format!("/providers/{id}"))).into_response());
    }

    let favorites = client_store::favorites(session).await;
    let compare = client_store::compare_set(session).await;
    let provider = snapshot
        .provider(id)
        .ok_or(AppError::ProviderNotFound(id))?;

    Ok((
        AppendHeaders([("HX-Trigger", SELECTION_UPDATED)]),
        SelectionActionsTemplate {
            selection: SelectionState::new(provider, &favorites, &compare),
            message,
        },
    )
        .into_response())
}

/// Save or unsave a provider (HTMX).
#[instrument(skip(state, session, headers, back))]
pub async fn toggle_favorite(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Path(id): Path<i32>,
    Form(back): Form<ReturnTo>,
) -> Result<Response> {
    let snapshot = state.catalog().snapshot().await;
    let id = require_provider(&snapshot, id)?;

    let mut favorites = client_store::favorites(&session).await;
    let saved = favorites.toggle(id);
    session
        .set_value(keys::FAVORITES, &favorites)
        .await?;

    let provider_id = id.to_string();
    add_breadcrumb(
        "favorites",
        if saved { "Saved provider" } else { "Unsaved provider" },
        Some(&[("provider_id", provider_id.as_str())]),
    );

    selection_response(&session, &snapshot, id, &headers, &back, "").await
}

/// Add a provider to, or remove it from, the compare tray (HTMX).
///
/// A fourth provider is refused and the tray is left unchanged.
#[instrument(skip(state, session, headers, back))]
pub async fn toggle_compare(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Path(id): Path<i32>,
    Form(back): Form<ReturnTo>,
) -> Result<Response> {
    let snapshot = state.catalog().snapshot().await;
    let id = require_provider(&snapshot, id)?;

    let mut compare = client_store::compare_set(&session).await;
    let message = match compare.toggle(id) {
        CompareOutcome::Full => "You can compare up to 3 providers. Remove one first.",
        CompareOutcome::Added | CompareOutcome::Removed => {
            session
                .set_value(keys::COMPARE, &compare)
                .await?;
            ""
        }
    };

    selection_response(&session, &snapshot, id, &headers, &back, message).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::DataSource;

    #[test]
    fn test_return_to_only_allows_local_paths() {
        let back = |s: &str| ReturnTo {
            return_to: s.to_owned(),
        };
        assert_eq!(back("/favorites").target("/providers/1"), "/favorites");
        assert_eq!(back("").target("/providers/1"), "/providers/1");
        assert_eq!(back("//evil.example").target("/x"), "/x");
        assert_eq!(back("https://evil.example").target("/x"), "/x");
    }

    #[test]
    fn test_filter_view_marks_selection() {
        let snapshot = DirectorySnapshot::seed(DataSource::Unconfigured);
        let filter = FilterState::from_query("category=insurance&tag=storage&sort=name-asc");
        let view = FilterView::new(&filter, &snapshot);

        let selected: Vec<_> = view.categories.iter().filter(|c| c.selected).collect();
        assert_eq!(selected.len(), 1);
        assert!(selected.iter().all(|c| c.id == "insurance"));
        assert!(view.tags.iter().any(|t| t.name == "storage" && t.checked));
        assert!(view.sorts.iter().any(|s| s.value == "name-asc" && s.selected));
    }
}
