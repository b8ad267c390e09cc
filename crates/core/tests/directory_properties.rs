use std::collections::BTreeSet;

use appy_link_core::CategorySlug;
use appy_link_core::directory::{FilterState, SortMode, filter_providers};
use appy_link_core::seed;
use appy_link_core::selection::{COMPARE_LIMIT, CompareSet};
use appy_link_core::types::ProviderId;
use chrono::Utc;
use proptest::prelude::*;

fn category_strategy() -> impl Strategy<Value = Option<CategorySlug>> {
    let ids: Vec<CategorySlug> = seed::categories().into_iter().map(|c| c.id).collect();
    prop_oneof![Just(None), proptest::sample::select(ids).prop_map(Some)]
}

fn tags_strategy() -> impl Strategy<Value = BTreeSet<String>> {
    let mut pool = appy_link_core::directory::all_tags(&seed::providers());
    pool.push("not-a-tag".to_owned());
    proptest::collection::btree_set(proptest::sample::select(pool), 0..3)
}

fn query_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        Just("crm".to_owned()),
        Just("STORAGE".to_owned()),
        Just("van".to_owned()),
        Just("removals".to_owned()),
        "[a-z ]{0,6}",
    ]
}

fn sort_strategy() -> impl Strategy<Value = SortMode> {
    proptest::sample::select(SortMode::ALL.to_vec())
}

fn filter_strategy() -> impl Strategy<Value = FilterState> {
    (
        query_strategy(),
        category_strategy(),
        tags_strategy(),
        any::<bool>(),
        sort_strategy(),
    )
        .prop_map(|(query, category, tags, discount_only, sort)| FilterState {
            query,
            category,
            tags,
            discount_only,
            sort,
            ..FilterState::default()
        })
}

proptest! {
    #[test]
    fn filtered_results_are_a_subset_satisfying_every_predicate(filter in filter_strategy()) {
        let providers = seed::providers();
        let result = filter_providers(&providers, &filter, Utc::now());

        prop_assert!(result.len() <= providers.len());
        for p in &result {
            prop_assert!(providers.iter().any(|q| q.id == p.id));
            prop_assert!(p.is_active);

            if let Some(category) = &filter.category {
                prop_assert_eq!(&p.category, category);
            }
            if !filter.tags.is_empty() {
                prop_assert!(p.tags.iter().any(|t| filter.tags.contains(t)));
            }
            if filter.discount_only {
                prop_assert!(p.discount.is_some());
            }
            let needle = filter.query.trim().to_lowercase();
            if !needle.is_empty() {
                let haystacks = [&p.name, &p.summary, &p.details];
                prop_assert!(
                    haystacks.iter().any(|h| h.to_lowercase().contains(&needle))
                        || p.tags.iter().any(|t| t.to_lowercase().contains(&needle))
                );
            }
        }
    }

    #[test]
    fn sort_mode_never_changes_membership(filter in filter_strategy(), other in sort_strategy()) {
        let providers = seed::providers();
        let now = Utc::now();
        let a: BTreeSet<_> = filter_providers(&providers, &filter, now).iter().map(|p| p.id.as_i32()).collect();
        let resorted = FilterState { sort: other, ..filter };
        let b: BTreeSet<_> = filter_providers(&providers, &resorted, now).iter().map(|p| p.id.as_i32()).collect();
        prop_assert_eq!(a, b);
    }

    #[test]
    fn compare_set_never_exceeds_limit(ops in proptest::collection::vec(1..8_i32, 0..40)) {
        let mut compare = CompareSet::default();
        for id in ops {
            compare.toggle(ProviderId::new(id));
            prop_assert!(compare.len() <= COMPARE_LIMIT);
        }
    }

    #[test]
    fn query_string_roundtrips(filter in filter_strategy()) {
        let parsed = FilterState::from_query(&filter.to_query(None));
        // Queries are trimmed on parse.
        let expected = FilterState { query: filter.query.trim().to_owned(), ..filter };
        prop_assert_eq!(parsed, expected);
    }
}
