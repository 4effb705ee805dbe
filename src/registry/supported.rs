//! Admin-mutable membership set for enumerable values (languages, categories)

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Set of values the registry currently accepts.
///
/// Iteration order is the enum's declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SupportedSet<T: Ord> {
    members: BTreeSet<T>,
}

impl<T: Ord + Copy> SupportedSet<T> {
    pub fn new(members: impl IntoIterator<Item = T>) -> Self {
        Self {
            members: members.into_iter().collect(),
        }
    }

    pub fn empty() -> Self {
        Self {
            members: BTreeSet::new(),
        }
    }

    pub fn contains(&self, value: T) -> bool {
        self.members.contains(&value)
    }

    /// Sets membership of `value`. Returns whether membership changed.
    pub fn set(&mut self, value: T, supported: bool) -> bool {
        if supported {
            self.members.insert(value)
        } else {
            self.members.remove(&value)
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        self.members.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}
