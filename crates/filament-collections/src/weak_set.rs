#![forbid(unsafe_code)]

//! An iterable set of weak references with opportunistic pruning.
//!
//! [`WeakSet`] holds `Weak<T>` entries deduplicated by pointer identity.
//! Entries whose referent has been dropped are never yielded by iteration
//! or membership checks; stale entries are pruned as a side effect of
//! `iter`, `contains`, and `remove` (liveness is checked manually rather
//! than through any finalizer mechanism, so pruning timing is best-effort
//! while correctness is exact).
//!
//! # Invariants
//!
//! 1. `iter()` and `contains()` never observe a dropped entry.
//! 2. Membership is pointer identity, not value equality.

use std::rc::{Rc, Weak};

/// A set of weak references that prunes itself as entries die.
pub struct WeakSet<T> {
    entries: Vec<Weak<T>>,
}

impl<T> std::fmt::Debug for WeakSet<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeakSet")
            .field("live", &self.len())
            .field("slots", &self.entries.len())
            .finish()
    }
}

impl<T> Default for WeakSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> WeakSet<T> {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Add `value`. Returns `false` if it was already present (by pointer
    /// identity).
    pub fn insert(&mut self, value: &Rc<T>) -> bool {
        if self.contains(value) {
            return false;
        }
        self.entries.push(Rc::downgrade(value));
        true
    }

    /// Whether `value` is present. Prunes dead entries.
    pub fn contains(&mut self, value: &Rc<T>) -> bool {
        self.prune();
        self.entries
            .iter()
            .any(|w| w.upgrade().is_some_and(|rc| Rc::ptr_eq(&rc, value)))
    }

    /// Remove `value`. Returns `true` if it was present. Prunes dead
    /// entries.
    pub fn remove(&mut self, value: &Rc<T>) -> bool {
        self.prune();
        let before = self.entries.len();
        self.entries
            .retain(|w| !w.upgrade().is_some_and(|rc| Rc::ptr_eq(&rc, value)));
        self.entries.len() < before
    }

    /// Iterate over live members, upgrading each to a strong handle.
    /// Prunes dead entries first.
    pub fn iter(&mut self) -> impl Iterator<Item = Rc<T>> + '_ {
        self.prune();
        self.entries.iter().filter_map(Weak::upgrade)
    }

    /// Number of live members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .iter()
            .filter(|w| w.strong_count() > 0)
            .count()
    }

    /// Whether no live members remain.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop entries whose referent has been collected.
    pub fn prune(&mut self) {
        self.entries.retain(|w| w.strong_count() > 0);
    }
}
