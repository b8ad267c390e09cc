//! Directory filtering, sorting and "load more" paging.
//!
//! The storefront keeps the whole active provider list in memory (it is small
//! and cached) and applies a [`FilterState`] to it on every request.
//!
//! Predicates:
//! - text query: case-insensitive substring over name, summary, details and
//!   tags, any field may match; a blank query matches everything
//! - category: exact match, or all categories
//! - tags: at least one selected tag present; no selection means no filter
//! - discount only: provider must carry a discount
//!
//! All predicates must hold. Inactive providers never appear.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::Provider;
use crate::types::CategorySlug;

/// Providers revealed per "load more" step.
pub const PAGE_SIZE: usize = 12;

/// Result ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortMode {
    /// Featured providers first, otherwise the incoming order.
    #[default]
    #[serde(rename = "relevance")]
    Relevance,
    #[serde(rename = "name-asc")]
    NameAsc,
    #[serde(rename = "name-desc")]
    NameDesc,
}

impl SortMode {
    pub const ALL: [Self; 3] = [Self::Relevance, Self::NameAsc, Self::NameDesc];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Relevance => "relevance",
            Self::NameAsc => "name-asc",
            Self::NameDesc => "name-desc",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Relevance => "Relevance",
            Self::NameAsc => "Name (A-Z)",
            Self::NameDesc => "Name (Z-A)",
        }
    }

    /// Parse a query value, falling back to relevance for anything unknown.
    #[must_use]
    pub fn from_param(s: &str) -> Self {
        match s {
            "name-asc" => Self::NameAsc,
            "name-desc" => Self::NameDesc,
            _ => Self::Relevance,
        }
    }
}

/// Everything the visitor can tweak on the directory page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterState {
    pub query: String,
    /// `None` means all categories.
    pub category: Option<CategorySlug>,
    pub tags: BTreeSet<String>,
    pub discount_only: bool,
    pub sort: SortMode,
    /// How many results to reveal; always a positive multiple of [`PAGE_SIZE`].
    pub limit: usize,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            query: String::new(),
            category: None,
            tags: BTreeSet::new(),
            discount_only: false,
            sort: SortMode::default(),
            limit: PAGE_SIZE,
        }
    }
}

impl FilterState {
    /// Build a filter from decoded query-string pairs.
    ///
    /// `tag` may repeat. Unknown keys and malformed values are ignored so a
    /// hand-edited URL still renders a page.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut state = Self::default();
        for (key, value) in pairs {
            let value = value.as_ref();
            match key.as_ref() {
                "q" => value.trim().clone_into(&mut state.query),
                "category" => {
                    state.category = match value {
                        "" | "all" => None,
                        other => CategorySlug::parse(other).ok(),
                    };
                }
                "tag" => {
                    let tag = value.trim();
                    if !tag.is_empty() {
                        state.tags.insert(tag.to_owned());
                    }
                }
                "discount" => state.discount_only = matches!(value, "1" | "on" | "true"),
                "sort" => state.sort = SortMode::from_param(value),
                "limit" => {
                    if let Ok(limit) = value.parse::<usize>() {
                        state.limit = normalize_limit(limit);
                    }
                }
                _ => {}
            }
        }
        state
    }

    /// Parse from a raw (still percent-encoded) query string.
    #[must_use]
    pub fn from_query(raw: &str) -> Self {
        Self::from_pairs(url::form_urlencoded::parse(raw.as_bytes()))
    }

    /// Encode back to a query string. `limit` is left out unless
    /// `with_limit` is set so that filter links start from the first page.
    #[must_use]
    pub fn to_query(&self, with_limit: Option<usize>) -> String {
        let mut ser = url::form_urlencoded::Serializer::new(String::new());
        if !self.query.is_empty() {
            ser.append_pair("q", &self.query);
        }
        if let Some(category) = &self.category {
            ser.append_pair("category", category.as_str());
        }
        for tag in &self.tags {
            ser.append_pair("tag", tag);
        }
        if self.discount_only {
            ser.append_pair("discount", "1");
        }
        if self.sort != SortMode::default() {
            ser.append_pair("sort", self.sort.as_str());
        }
        if let Some(limit) = with_limit {
            ser.append_pair("limit", &limit.to_string());
        }
        ser.finish()
    }

    /// Query string for the next "load more" step.
    #[must_use]
    pub fn next_page_query(&self) -> String {
        self.to_query(Some(self.limit + PAGE_SIZE))
    }

    /// Query string with `tag` switched on or off, back on the first page.
    #[must_use]
    pub fn toggle_tag_query(&self, tag: &str) -> String {
        let mut next = self.clone();
        if !next.tags.remove(tag) {
            next.tags.insert(tag.to_owned());
        }
        next.to_query(None)
    }

    #[must_use]
    pub fn is_category(&self, id: &str) -> bool {
        self.category.as_ref().is_some_and(|c| c == id)
    }

    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    /// Whether `provider` satisfies every active predicate.
    #[must_use]
    pub fn matches(&self, provider: &Provider) -> bool {
        provider.is_active
            && matches_query(provider, &self.query)
            && self.category.as_ref().is_none_or(|c| provider.category == *c)
            && (self.tags.is_empty() || provider.tags.iter().any(|t| self.tags.contains(t)))
            && (!self.discount_only || provider.has_discount())
    }
}

/// Round up to a positive multiple of [`PAGE_SIZE`].
fn normalize_limit(limit: usize) -> usize {
    limit.div_ceil(PAGE_SIZE).max(1) * PAGE_SIZE
}

fn matches_query(provider: &Provider, query: &str) -> bool {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    let hit = |field: &str| field.to_lowercase().contains(&needle);
    hit(&provider.name)
        || hit(&provider.summary)
        || hit(&provider.details)
        || provider.tags.iter().any(|t| hit(t))
}

/// Apply `filter` to `providers` and order the survivors.
///
/// `now` decides whether time-bounded featured flags still count for
/// relevance ordering.
#[must_use]
pub fn filter_providers<'a>(
    providers: &'a [Provider],
    filter: &FilterState,
    now: DateTime<Utc>,
) -> Vec<&'a Provider> {
    let mut visible: Vec<&Provider> = providers.iter().filter(|p| filter.matches(p)).collect();
    sort_providers(&mut visible, filter.sort, now);
    visible
}

/// Stable in-place sort.
pub fn sort_providers(providers: &mut [&Provider], mode: SortMode, now: DateTime<Utc>) {
    match mode {
        SortMode::Relevance => {
            providers.sort_by_key(|p| !p.is_featured_at(now));
        }
        SortMode::NameAsc => providers.sort_by_cached_key(|p| name_key(p)),
        SortMode::NameDesc => {
            providers.sort_by_cached_key(|p| std::cmp::Reverse(name_key(p)));
        }
    }
}

/// Case-insensitive name, with the exact name breaking ties.
fn name_key(p: &Provider) -> (String, String) {
    (p.name.to_lowercase(), p.name.clone())
}

/// One "load more" step of results.
#[derive(Debug, Clone)]
pub struct Page<'a> {
    pub items: Vec<&'a Provider>,
    pub shown: usize,
    pub total: usize,
    pub remaining: usize,
}

impl Page<'_> {
    #[must_use]
    pub const fn has_more(&self) -> bool {
        self.remaining > 0
    }
}

/// Keep the first `limit` results.
#[must_use]
pub fn paginate(results: Vec<&Provider>, limit: usize) -> Page<'_> {
    let total = results.len();
    let mut items = results;
    items.truncate(limit);
    let shown = items.len();
    Page {
        items,
        shown,
        total,
        remaining: total - shown,
    }
}

/// Sorted, de-duplicated tags across all active providers.
#[must_use]
pub fn all_tags(providers: &[Provider]) -> Vec<String> {
    providers
        .iter()
        .filter(|p| p.is_active)
        .flat_map(|p| p.tags.iter().cloned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::seed;

    fn names(list: &[&Provider]) -> Vec<String> {
        list.iter().map(|p| p.name.clone()).collect()
    }

    #[test]
    fn test_blank_filter_returns_all_active() {
        let providers = seed::providers();
        let active = providers.iter().filter(|p| p.is_active).count();
        let result = filter_providers(&providers, &FilterState::default(), Utc::now());
        assert_eq!(result.len(), active);
    }

    #[test]
    fn test_query_matches_tags_case_insensitively() {
        let providers = seed::providers();
        let filter = FilterState {
            query: "  CRM ".to_owned(),
            ..FilterState::default()
        };
        let result = filter_providers(&providers, &filter, Utc::now());
        assert!(!result.is_empty());
        assert!(result.iter().all(|p| {
            p.name.to_lowercase().contains("crm")
                || p.summary.to_lowercase().contains("crm")
                || p.details.to_lowercase().contains("crm")
                || p.tags.iter().any(|t| t.to_lowercase().contains("crm"))
        }));
    }

    #[test]
    fn test_category_and_discount_compose() {
        let providers = seed::providers();
        let filter = FilterState {
            category: Some(CategorySlug::parse("software").unwrap()),
            discount_only: true,
            ..FilterState::default()
        };
        let result = filter_providers(&providers, &filter, Utc::now());
        assert!(
            result
                .iter()
                .all(|p| p.category == *"software" && p.discount.is_some())
        );
    }

    #[test]
    fn test_tag_filter_needs_one_intersection() {
        let providers = seed::providers();
        let filter = FilterState {
            tags: ["storage".to_owned(), "no-such-tag".to_owned()].into(),
            ..FilterState::default()
        };
        let result = filter_providers(&providers, &filter, Utc::now());
        assert!(!result.is_empty());
        assert!(result.iter().all(|p| p.tags.iter().any(|t| t == "storage")));
    }

    #[test]
    fn test_name_sorts_are_reverses() {
        let providers = seed::providers();
        let now = Utc::now();
        let asc = filter_providers(
            &providers,
            &FilterState {
                sort: SortMode::NameAsc,
                ..FilterState::default()
            },
            now,
        );
        let desc = filter_providers(
            &providers,
            &FilterState {
                sort: SortMode::NameDesc,
                ..FilterState::default()
            },
            now,
        );
        let mut reversed = names(&desc);
        reversed.reverse();
        assert_eq!(names(&asc), reversed);
    }

    #[test]
    fn test_relevance_puts_featured_first_and_is_stable() {
        let providers = seed::providers();
        let now = Utc::now();
        let result = filter_providers(&providers, &FilterState::default(), now);
        let first_plain = result
            .iter()
            .position(|p| !p.is_featured_at(now))
            .unwrap_or(result.len());
        assert!(result[..first_plain].iter().all(|p| p.is_featured_at(now)));
        assert!(result[first_plain..].iter().all(|p| !p.is_featured_at(now)));

        let plain_in_input: Vec<_> = providers
            .iter()
            .filter(|p| p.is_active && !p.is_featured_at(now))
            .map(|p| p.name.clone())
            .collect();
        assert_eq!(names(&result[first_plain..]), plain_in_input);
    }

    #[test]
    fn test_from_query() {
        let state = FilterState::from_query(
            "q=removal+crm&category=software&tag=crm&tag=storage&discount=1&sort=name-desc&limit=13",
        );
        assert_eq!(state.query, "removal crm");
        assert!(state.is_category("software"));
        assert!(state.has_tag("crm") && state.has_tag("storage"));
        assert!(state.discount_only);
        assert_eq!(state.sort, SortMode::NameDesc);
        assert_eq!(state.limit, 24);
    }

    #[test]
    fn test_from_query_tolerates_garbage() {
        let state = FilterState::from_query("category=Not+A+Slug&sort=weird&limit=abc&x=1");
        assert_eq!(state, FilterState::default());
        assert_eq!(FilterState::from_query("category=all").category, None);
        assert_eq!(FilterState::from_query("limit=0").limit, PAGE_SIZE);
    }

    #[test]
    fn test_query_roundtrip() {
        let raw = "q=van&category=vehicle_hire&tag=vans&discount=1&sort=name-asc";
        let state = FilterState::from_query(raw);
        assert_eq!(FilterState::from_query(&state.to_query(None)), state);
        assert!(state.next_page_query().ends_with("limit=24"));
    }

    #[test]
    fn test_toggle_tag_query_resets_paging() {
        let state = FilterState::from_query("tag=vans&limit=36");
        assert_eq!(state.toggle_tag_query("vans"), "");
        assert_eq!(state.toggle_tag_query("luton"), "tag=luton&tag=vans");
    }

    #[test]
    fn test_paginate() {
        let providers = seed::providers();
        let all: Vec<&Provider> = providers.iter().collect();
        let total = all.len();
        let page = paginate(all, 2);
        assert_eq!(page.shown, 2);
        assert_eq!(page.total, total);
        assert_eq!(page.remaining, total - 2);
        assert!(page.has_more());

        let page = paginate(providers.iter().collect(), PAGE_SIZE * 10);
        assert_eq!(page.remaining, 0);
        assert!(!page.has_more());
    }

    #[test]
    fn test_all_tags_sorted_unique() {
        let tags = all_tags(&seed::providers());
        let mut expected = tags.clone();
        expected.sort();
        expected.dedup();
        assert_eq!(tags, expected);
        assert!(tags.contains(&"crm".to_owned()));
    }
}
