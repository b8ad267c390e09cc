//! Visitor-scoped provider selections: favorites and the compare tray.
//!
//! Both are small ordered id lists that the storefront persists per visitor.
//! They serialize as plain JSON arrays.

use serde::{Deserialize, Serialize};

use crate::types::ProviderId;

/// Most providers that can be compared side by side.
pub const COMPARE_LIMIT: usize = 3;

/// Saved providers, in the order they were saved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Favorites(Vec<ProviderId>);

impl Favorites {
    /// Add `id` if absent, remove it otherwise. Returns whether it is now saved.
    pub fn toggle(&mut self, id: ProviderId) -> bool {
        if let Some(pos) = self.0.iter().position(|&f| f == id) {
            self.0.remove(pos);
            false
        } else {
            self.0.push(id);
            true
        }
    }

    #[must_use]
    pub fn contains(&self, id: ProviderId) -> bool {
        self.0.contains(&id)
    }

    #[must_use]
    pub fn ids(&self) -> &[ProviderId] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// What happened when toggling a provider in the compare tray.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOutcome {
    Added,
    Removed,
    /// The tray already held [`COMPARE_LIMIT`] providers; nothing changed.
    Full,
}

/// Up to [`COMPARE_LIMIT`] providers to compare.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CompareSet(Vec<ProviderId>);

impl CompareSet {
    pub fn toggle(&mut self, id: ProviderId) -> CompareOutcome {
        if let Some(pos) = self.0.iter().position(|&c| c == id) {
            self.0.remove(pos);
            CompareOutcome::Removed
        } else if self.0.len() >= COMPARE_LIMIT {
            CompareOutcome::Full
        } else {
            self.0.push(id);
            CompareOutcome::Added
        }
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    #[must_use]
    pub fn contains(&self, id: ProviderId) -> bool {
        self.0.contains(&id)
    }

    #[must_use]
    pub fn ids(&self) -> &[ProviderId] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.0.len() >= COMPARE_LIMIT
    }
}

// Stored data may predate the cap or have been tampered with; keep the
// first entries and drop duplicates rather than failing the whole page.
impl<'de> Deserialize<'de> for CompareSet {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Vec::<ProviderId>::deserialize(deserializer)?;
        let mut set = Self::default();
        for id in raw {
            if set.is_full() {
                break;
            }
            if !set.contains(id) {
                set.0.push(id);
            }
        }
        Ok(set)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn id(n: i32) -> ProviderId {
        ProviderId::new(n)
    }

    #[test]
    fn test_favorites_toggle() {
        let mut favs = Favorites::default();
        assert!(favs.toggle(id(1)));
        assert!(favs.toggle(id(2)));
        assert!(!favs.toggle(id(1)));
        assert_eq!(favs.ids(), &[id(2)]);
    }

    #[test]
    fn test_fourth_compare_leaves_set_unchanged() {
        let mut compare = CompareSet::default();
        for n in 1..=3 {
            assert_eq!(compare.toggle(id(n)), CompareOutcome::Added);
        }
        let before = compare.clone();
        assert_eq!(compare.toggle(id(4)), CompareOutcome::Full);
        assert_eq!(compare, before);
        assert_eq!(compare.len(), COMPARE_LIMIT);
    }

    #[test]
    fn test_compare_remove_makes_room() {
        let mut compare = CompareSet::default();
        for n in 1..=3 {
            compare.toggle(id(n));
        }
        assert_eq!(compare.toggle(id(2)), CompareOutcome::Removed);
        assert_eq!(compare.toggle(id(4)), CompareOutcome::Added);
        assert_eq!(compare.ids(), &[id(1), id(3), id(4)]);
    }

    #[test]
    fn test_compare_deserialize_enforces_cap() {
        let set: CompareSet = serde_json::from_str("[5, 5, 6, 7, 8]").unwrap();
        assert_eq!(set.ids(), &[id(5), id(6), id(7)]);
    }
}
