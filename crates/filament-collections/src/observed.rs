#![forbid(unsafe_code)]

//! Mutation-observing containers.
//!
//! [`ObservedVec`] and [`ObservedMap`] are explicit facades over `Vec` and
//! a hash map: every mutating operation goes through a method that performs
//! the change and then invokes the configured update hook. Reads never
//! notify. The vector variant can route notifications through a
//! [`Debounce`] so a burst of mutations coalesces into one callback, and
//! can apply a transform to values before they are stored at an index.
//!
//! # Invariants
//!
//! 1. Every mutating call that changes content fires the hook exactly once
//!    (or arms the debounce once).
//! 2. Out-of-range index writes are tolerated: a write past the end appends
//!    at the boundary and anything further is clamped, with a debug-level
//!    diagnostic rather than an error.

use ahash::AHashMap;
use filament_core::debounce::Debounce;
use filament_core::scheduler::Scheduler;
use tracing::debug;
use web_time::Duration;

/// What changed in an [`ObservedVec`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VecChange {
    /// The element at this index was written.
    Set(usize),
    /// An element was appended at this index.
    Pushed(usize),
    /// The element at this index was removed.
    Removed(usize),
    /// The vector was truncated to this length.
    Truncated(usize),
}

enum Notifier {
    Immediate(Box<dyn FnMut(VecChange)>),
    Debounced(Debounce<VecChange>),
}

/// A `Vec` facade that reports every mutation through an update hook.
pub struct ObservedVec<T> {
    items: Vec<T>,
    transform: Option<Box<dyn FnMut(T) -> T>>,
    notifier: Notifier,
}

impl<T: std::fmt::Debug> std::fmt::Debug for ObservedVec<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObservedVec")
            .field("items", &self.items)
            .finish()
    }
}

impl<T: 'static> ObservedVec<T> {
    /// Observe mutations with an immediate hook.
    pub fn new(update: impl FnMut(VecChange) + 'static) -> Self {
        Self {
            items: Vec::new(),
            transform: None,
            notifier: Notifier::Immediate(Box::new(update)),
        }
    }

    /// Observe mutations with a hook debounced by `delay` on `scheduler`.
    /// A burst of mutations produces one callback, carrying the last
    /// change.
    pub fn debounced(
        scheduler: &Scheduler,
        delay: Duration,
        update: impl FnMut(VecChange) + 'static,
    ) -> Self {
        Self {
            items: Vec::new(),
            transform: None,
            notifier: Notifier::Debounced(Debounce::new(scheduler, delay, update)),
        }
    }

    /// Apply `transform` to values before they are stored by
    /// [`set`](Self::set).
    #[must_use]
    pub fn with_transform(mut self, transform: impl FnMut(T) -> T + 'static) -> Self {
        self.transform = Some(Box::new(transform));
        self
    }

    /// Seed initial contents without notifying.
    #[must_use]
    pub fn with_items(mut self, items: impl IntoIterator<Item = T>) -> Self {
        self.items = items.into_iter().collect();
        self
    }

    fn notify(&mut self, change: VecChange) {
        match &mut self.notifier {
            Notifier::Immediate(hook) => hook(change),
            Notifier::Debounced(debounce) => debounce.call(change),
        }
    }

    /// Write `value` at `index`, applying the transform first. An index at
    /// the current length appends; anything past that is clamped to an
    /// append (with a diagnostic).
    pub fn set(&mut self, index: usize, value: T) {
        let value = match &mut self.transform {
            Some(transform) => transform(value),
            None => value,
        };
        let len = self.items.len();
        if index < len {
            self.items[index] = value;
            self.notify(VecChange::Set(index));
        } else {
            if index > len {
                debug!(index, len, "index write past end clamped to append");
            }
            self.items.push(value);
            self.notify(VecChange::Pushed(len));
        }
    }

    /// Append `value`.
    pub fn push(&mut self, value: T) {
        self.items.push(value);
        self.notify(VecChange::Pushed(self.items.len() - 1));
    }

    /// Remove and return the last element.
    pub fn pop(&mut self) -> Option<T> {
        let value = self.items.pop()?;
        self.notify(VecChange::Removed(self.items.len()));
        Some(value)
    }

    /// Remove and return the element at `index`; `None` (no notification)
    /// when out of range.
    pub fn remove(&mut self, index: usize) -> Option<T> {
        if index >= self.items.len() {
            debug!(index, len = self.items.len(), "remove out of range ignored");
            return None;
        }
        let value = self.items.remove(index);
        self.notify(VecChange::Removed(index));
        Some(value)
    }

    /// Shrink to `len`. Growing is a no-op; an actual shrink notifies once.
    pub fn truncate(&mut self, len: usize) {
        if len >= self.items.len() {
            if len > self.items.len() {
                debug!(len, current = self.items.len(), "truncate cannot grow");
            }
            return;
        }
        self.items.truncate(len);
        self.notify(VecChange::Truncated(len));
    }

    /// Element at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    /// Current length.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the vector is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The backing contents as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    /// Iterate over the contents.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }
}

/// What changed in an [`ObservedMap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapChange {
    /// The value for a key was inserted or replaced.
    Inserted,
    /// A key was removed.
    Removed,
}

type MapHook<K> = Box<dyn FnMut(&K, MapChange)>;

/// A hash-map facade that reports every mutation through layered hooks.
///
/// Hooks run in the order they were added; [`push_layer`](Self::push_layer)
/// stacks additional trap behavior on top of the base hook.
pub struct ObservedMap<K, V> {
    entries: AHashMap<K, V>,
    hooks: Vec<MapHook<K>>,
}

impl<K: std::fmt::Debug, V: std::fmt::Debug> std::fmt::Debug for ObservedMap<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObservedMap")
            .field("entries", &self.entries)
            .field("layers", &self.hooks.len())
            .finish()
    }
}

impl<K: Eq + std::hash::Hash, V> ObservedMap<K, V> {
    /// Observe mutations with a base hook.
    pub fn new(update: impl FnMut(&K, MapChange) + 'static) -> Self {
        Self {
            entries: AHashMap::new(),
            hooks: vec![Box::new(update)],
        }
    }

    /// Stack another hook; it runs after the existing ones.
    pub fn push_layer(&mut self, hook: impl FnMut(&K, MapChange) + 'static) {
        self.hooks.push(Box::new(hook));
    }

    fn notify(&mut self, key: &K, change: MapChange) {
        for hook in &mut self.hooks {
            hook(key, change);
        }
    }

    /// Insert or replace; returns the previous value.
    pub fn insert(&mut self, key: K, value: V) -> Option<V>
    where
        K: Clone,
    {
        let previous = self.entries.insert(key.clone(), value);
        self.notify(&key, MapChange::Inserted);
        previous
    }

    /// Remove a key; `None` (no notification) when absent.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        match self.entries.remove_entry(key) {
            Some((key, value)) => {
                self.notify(&key, MapChange::Removed);
                Some(value)
            }
            None => None,
        }
    }

    /// Value for `key`.
    #[must_use]
    pub fn get(&self, key: &K) -> Option<&V> {
        self.entries.get(key)
    }

    /// Whether `key` is present.
    #[must_use]
    pub fn contains_key(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over entries.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.entries.iter()
    }
}
