//! Display data shared by several templates.

use axum::http::HeaderMap;
use chrono::{DateTime, Utc};

use appy_link_core::catalog::Provider;
use appy_link_core::selection::{COMPARE_LIMIT, CompareSet, Favorites};

use crate::services::client_store::{self, ClientStore};
use crate::services::{DataSource, DirectorySnapshot};

/// Tags shown on a card before the rest are cut off.
const CARD_TAGS: usize = 3;

/// Whether the request came from HTMX and wants a fragment.
#[must_use]
pub fn is_htmx(headers: &HeaderMap) -> bool {
    headers.contains_key("hx-request")
}

/// Selection counts shown in the header on every page.
#[derive(Debug, Clone, Copy, Default)]
pub struct NavCounts {
    pub favorites: usize,
    pub compare: usize,
    pub compare_limit: usize,
}

impl NavCounts {
    pub async fn load(store: &impl ClientStore) -> Self {
        Self::from_selection(
            &client_store::favorites(store).await,
            &client_store::compare_set(store).await,
        )
    }

    #[must_use]
    pub fn from_selection(favorites: &Favorites, compare: &CompareSet) -> Self {
        Self {
            favorites: favorites.len(),
            compare: compare.len(),
            compare_limit: COMPARE_LIMIT,
        }
    }
}

/// Status line above the results: where data came from.
#[derive(Debug, Clone)]
pub struct SourceNotice {
    pub text: &'static str,
    pub is_local: bool,
}

impl From<DataSource> for SourceNotice {
    fn from(source: DataSource) -> Self {
        Self {
            text: source.notice(),
            is_local: !source.is_live(),
        }
    }
}

/// Favorite/compare state of one provider for the current visitor.
#[derive(Debug, Clone, Copy)]
pub struct SelectionState {
    pub provider_id: i32,
    pub is_favorite: bool,
    pub in_compare: bool,
    pub compare_full: bool,
}

impl SelectionState {
    #[must_use]
    pub fn new(provider: &Provider, favorites: &Favorites, compare: &CompareSet) -> Self {
        Self {
            provider_id: provider.id.as_i32(),
            is_favorite: favorites.contains(provider.id),
            in_compare: compare.contains(provider.id),
            compare_full: compare.is_full(),
        }
    }
}

/// A provider as shown in the results grid.
#[derive(Debug, Clone)]
pub struct ProviderCard {
    pub id: i32,
    pub name: String,
    pub category_label: String,
    pub tags: Vec<String>,
    pub summary: String,
    pub logo: String,
    pub featured: bool,
    pub discount: Option<String>,
    pub selection: SelectionState,
}

impl ProviderCard {
    #[must_use]
    pub fn new(
        provider: &Provider,
        snapshot: &DirectorySnapshot,
        favorites: &Favorites,
        compare: &CompareSet,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: provider.id.as_i32(),
            name: provider.name.clone(),
            category_label: snapshot.category_label(&provider.category).to_owned(),
            tags: provider.tags.iter().take(CARD_TAGS).cloned().collect(),
            summary: provider.summary.clone(),
            logo: provider.logo_src(),
            featured: provider.is_featured_at(now),
            discount: provider.discount.as_ref().map(|d| d.label.clone()),
            selection: SelectionState::new(provider, favorites, compare),
        }
    }
}

/// Full provider details for the profile and compare pages.
#[derive(Debug, Clone)]
pub struct ProviderDetail {
    pub id: i32,
    pub name: String,
    pub category_id: String,
    pub category_label: String,
    pub tags: Vec<String>,
    pub website: Option<String>,
    pub summary: String,
    pub details: String,
    pub discount_label: Option<String>,
    pub discount_details: Option<String>,
    pub logo: String,
    pub featured: bool,
    pub tier: &'static str,
    pub selection: SelectionState,
}

impl ProviderDetail {
    #[must_use]
    pub fn new(
        provider: &Provider,
        snapshot: &DirectorySnapshot,
        favorites: &Favorites,
        compare: &CompareSet,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: provider.id.as_i32(),
            name: provider.name.clone(),
            category_id: provider.category.as_str().to_owned(),
            category_label: snapshot.category_label(&provider.category).to_owned(),
            tags: provider.tags.clone(),
            website: provider.website.clone(),
            summary: provider.summary.clone(),
            details: provider.details.clone(),
            discount_label: provider.discount.as_ref().map(|d| d.label.clone()),
            discount_details: provider.discount.as_ref().and_then(|d| d.details.clone()),
            logo: provider.logo_src(),
            featured: provider.is_featured_at(now),
            tier: provider.tier.label(),
            selection: SelectionState::new(provider, favorites, compare),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use appy_link_core::ProviderId;

    use super::*;

    #[test]
    fn test_is_htmx() {
        let mut headers = HeaderMap::new();
        assert!(!is_htmx(&headers));
        headers.insert("hx-request", "true".parse().unwrap());
        assert!(is_htmx(&headers));
    }

    #[test]
    fn test_card_truncates_tags_and_flags_selection() {
        let snapshot = DirectorySnapshot::seed(DataSource::Unconfigured);
        let moveman = snapshot.providers.iter().find(|p| p.name == "MoveMan").unwrap();
        let mut favorites = Favorites::default();
        favorites.toggle(moveman.id);
        let mut compare = CompareSet::default();
        for id in [1, 2, 3] {
            compare.toggle(ProviderId::new(id));
        }

        let card = ProviderCard::new(moveman, &snapshot, &favorites, &compare, Utc::now());
        assert_eq!(card.category_label, "Software & CRM");
        assert!(card.tags.len() <= 3);
        assert!(card.featured);
        assert_eq!(card.discount.as_deref(), Some("1 month free"));
        assert!(card.selection.is_favorite);
        assert!(card.selection.compare_full);

        let nav = NavCounts::from_selection(&favorites, &compare);
        assert_eq!((nav.favorites, nav.compare, nav.compare_limit), (1, 3, 3));
    }
}
