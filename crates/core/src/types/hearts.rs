//! A user's set of favorite ("hearted") stores.

use serde::{Deserialize, Serialize};

use super::id::StoreId;

/// Membership of one store in a user's hearts after a toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeartState {
    /// The store is in the set.
    Hearted,
    /// The store is not in the set.
    Unhearted,
}

/// Insertion-ordered set of store IDs.
///
/// Adding an ID that is already present is a no-op, so the set never holds
/// duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<StoreId>", into = "Vec<StoreId>")]
pub struct Hearts(Vec<StoreId>);

impl Hearts {
    /// An empty set.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Whether `store` is hearted.
    #[must_use]
    pub fn contains(&self, store: StoreId) -> bool {
        self.0.contains(&store)
    }

    /// Add `store` unless already present. Returns `true` if it was added.
    pub fn insert(&mut self, store: StoreId) -> bool {
        if self.contains(store) {
            return false;
        }
        self.0.push(store);
        true
    }

    /// Remove `store`. Returns `true` if it was present.
    pub fn remove(&mut self, store: StoreId) -> bool {
        let before = self.0.len();
        self.0.retain(|id| *id != store);
        self.0.len() != before
    }

    /// Flip membership of `store` and return the new state.
    pub fn toggle(&mut self, store: StoreId) -> HeartState {
        if self.remove(store) {
            HeartState::Unhearted
        } else {
            self.0.push(store);
            HeartState::Hearted
        }
    }

    /// Number of hearted stores.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no store is hearted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The IDs in insertion order.
    #[must_use]
    pub fn as_slice(&self) -> &[StoreId] {
        &self.0
    }

    /// Iterate the IDs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = StoreId> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<StoreId> for Hearts {
    fn from_iter<I: IntoIterator<Item = StoreId>>(iter: I) -> Self {
        let mut hearts = Self::new();
        for id in iter {
            hearts.insert(id);
        }
        hearts
    }
}

impl From<Vec<StoreId>> for Hearts {
    fn from(ids: Vec<StoreId>) -> Self {
        ids.into_iter().collect()
    }
}

impl From<Hearts> for Vec<StoreId> {
    fn from(hearts: Hearts) -> Self {
        hearts.0
    }
}
