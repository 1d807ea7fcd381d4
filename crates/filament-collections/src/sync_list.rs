#![forbid(unsafe_code)]

//! `SyncList`: keeps a raw data array and a materialized instance array
//! consistent under mutation.
//!
//! A [`SyncList`] owns two backing vectors — `data: Vec<D>` and
//! `instances: Vec<I>` — of which exactly one is *active* at a time,
//! selected by the `creatable` flag; the inactive vector is always empty.
//! A [`Binder`] supplies the conversions between the two shapes:
//! `create` materializes a `D` into an `I`, `get_data` reads the `D` view
//! of an `I`, and `set_data` writes a `D` into an existing `I` in place.
//!
//! The type's own method surface is the safe view the rest of the toolkit
//! mutates through: whichever vector is active, elements entering the
//! collection are materialized as needed and elements leaving are flattened
//! back to `D`, so callers always observe data-shaped values. Every
//! structural change fires the update callback exactly once — immediately,
//! or through a debounce that coalesces a burst into one notification.
//!
//! # Invariants
//!
//! 1. Exactly one backing vector is active; the other is empty.
//! 2. Toggling `creatable` bulk-converts the whole collection and fires one
//!    update for the batch.
//! 3. Each structural mutation fires at most one update notification.
//! 4. Callers only ever see `D` values, regardless of the active mode.
//!
//! # Failure Modes
//!
//! This engine has no error type. Malformed indices are clamped or ignored
//! — an index write past the end appends, truncate cannot grow — with a
//! debug-level diagnostic so misuse is observable without breaking
//! array-like call sites.

use std::cmp::Ordering;

use filament_core::debounce::Debounce;
use filament_core::scheduler::Scheduler;
use tracing::debug;
use web_time::Duration;

/// Conversions between the raw data shape `D` and the materialized
/// instance shape `I`.
pub struct Binder<D, I> {
    create: Box<dyn FnMut(&D) -> I>,
    get_data: Box<dyn Fn(&I) -> D>,
    set_data: Box<dyn FnMut(&mut I, D)>,
}

impl<D, I> std::fmt::Debug for Binder<D, I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Binder")
    }
}

impl<D, I> Binder<D, I> {
    /// Bundle the three conversion functions.
    pub fn new(
        create: impl FnMut(&D) -> I + 'static,
        get_data: impl Fn(&I) -> D + 'static,
        set_data: impl FnMut(&mut I, D) + 'static,
    ) -> Self {
        Self {
            create: Box::new(create),
            get_data: Box::new(get_data),
            set_data: Box::new(set_data),
        }
    }
}

enum UpdateSink {
    Silent,
    Immediate(Box<dyn FnMut()>),
    Debounced(Debounce<()>),
}

/// Configures and builds a [`SyncList`].
pub struct SyncListBuilder<D, I> {
    binder: Binder<D, I>,
    creatable: bool,
    update: Option<Box<dyn FnMut()>>,
    delay: Option<(Scheduler, Duration)>,
}

impl<D, I> std::fmt::Debug for SyncListBuilder<D, I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncListBuilder")
            .field("creatable", &self.creatable)
            .field("has_update", &self.update.is_some())
            .field("debounced", &self.delay.is_some())
            .finish()
    }
}

impl<D: 'static, I: 'static> SyncListBuilder<D, I> {
    /// Start from a binder; the list begins empty and non-creatable.
    #[must_use]
    pub fn new(binder: Binder<D, I>) -> Self {
        Self {
            binder,
            creatable: false,
            update: None,
            delay: None,
        }
    }

    /// Initial mode.
    #[must_use]
    pub fn creatable(mut self, creatable: bool) -> Self {
        self.creatable = creatable;
        self
    }

    /// Callback fired after structural changes.
    #[must_use]
    pub fn on_update(mut self, update: impl FnMut() + 'static) -> Self {
        self.update = Some(Box::new(update));
        self
    }

    /// Debounce update notifications by `delay` on `scheduler`.
    #[must_use]
    pub fn update_delay(mut self, scheduler: &Scheduler, delay: Duration) -> Self {
        self.delay = Some((scheduler.clone(), delay));
        self
    }

    /// Build the list.
    #[must_use]
    pub fn build(self) -> SyncList<D, I> {
        let update = match (self.update, self.delay) {
            (Some(mut callback), Some((scheduler, delay))) => UpdateSink::Debounced(
                Debounce::new(&scheduler, delay, move |()| callback()),
            ),
            (Some(callback), None) => UpdateSink::Immediate(callback),
            (None, _) => UpdateSink::Silent,
        };
        SyncList {
            data: Vec::new(),
            instances: Vec::new(),
            creatable: self.creatable,
            binder: self.binder,
            update,
        }
    }
}

/// Synchronized dual-representation list. See the module docs.
pub struct SyncList<D, I> {
    data: Vec<D>,
    instances: Vec<I>,
    creatable: bool,
    binder: Binder<D, I>,
    update: UpdateSink,
}

impl<D: std::fmt::Debug + Clone + 'static, I: 'static> std::fmt::Debug for SyncList<D, I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncList")
            .field("creatable", &self.creatable)
            .field("len", &self.len())
            .field("data", &self.data)
            .finish()
    }
}

impl<D: Clone + 'static, I: 'static> SyncList<D, I> {
    /// Current mode: `true` when the instance vector is active.
    #[must_use]
    pub fn creatable(&self) -> bool {
        self.creatable
    }

    /// Switch modes, bulk-converting the whole collection and firing one
    /// update. Setting the current mode is a no-op.
    pub fn set_creatable(&mut self, creatable: bool) {
        if creatable == self.creatable {
            return;
        }
        if creatable {
            for item in std::mem::take(&mut self.data) {
                let instance = (self.binder.create)(&item);
                self.instances.push(instance);
            }
        } else {
            for instance in std::mem::take(&mut self.instances) {
                self.data.push((self.binder.get_data)(&instance));
            }
        }
        self.creatable = creatable;
        self.touch();
    }

    /// The raw data vector (empty while creatable).
    #[must_use]
    pub fn data(&self) -> &[D] {
        &self.data
    }

    /// The materialized instance vector (empty while not creatable).
    #[must_use]
    pub fn instances(&self) -> &[I] {
        &self.instances
    }

    /// Logical length, whichever vector is active.
    #[must_use]
    pub fn len(&self) -> usize {
        if self.creatable {
            self.instances.len()
        } else {
            self.data.len()
        }
    }

    /// Whether the collection is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The data view of the element at `index`; `None` out of range.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<D> {
        if self.creatable {
            self.instances.get(index).map(|i| (self.binder.get_data)(i))
        } else {
            self.data.get(index).cloned()
        }
    }

    /// Write `value` at `index`. In bounds updates in place (through
    /// `set_data` when creatable); an index at the length appends; past the
    /// length clamps to an append with a diagnostic. Fires one update.
    pub fn set(&mut self, index: usize, value: D) {
        let len = self.len();
        if index > len {
            debug!(index, len, "index write past end clamped to append");
        }
        if index >= len {
            self.push(value);
            return;
        }
        if self.creatable {
            (self.binder.set_data)(&mut self.instances[index], value);
        } else {
            self.data[index] = value;
        }
        self.touch();
    }

    /// Append `value`, materializing it when creatable. Fires one update.
    pub fn push(&mut self, value: D) {
        if self.creatable {
            let instance = (self.binder.create)(&value);
            self.instances.push(instance);
        } else {
            self.data.push(value);
        }
        self.touch();
    }

    /// Remove and return the last element as data. Fires one update when
    /// something was removed.
    pub fn pop(&mut self) -> Option<D> {
        let value = if self.creatable {
            let instance = self.instances.pop()?;
            (self.binder.get_data)(&instance)
        } else {
            self.data.pop()?
        };
        self.touch();
        Some(value)
    }

    /// Remove and return the first element as data. Fires one update when
    /// something was removed.
    pub fn shift(&mut self) -> Option<D> {
        if self.is_empty() {
            return None;
        }
        let value = if self.creatable {
            let instance = self.instances.remove(0);
            (self.binder.get_data)(&instance)
        } else {
            self.data.remove(0)
        };
        self.touch();
        Some(value)
    }

    /// Insert `value` at the front. Fires one update.
    pub fn unshift(&mut self, value: D) {
        if self.creatable {
            let instance = (self.binder.create)(&value);
            self.instances.insert(0, instance);
        } else {
            self.data.insert(0, value);
        }
        self.touch();
    }

    /// Remove `delete_count` elements starting at `start` (both clamped to
    /// bounds) and insert `items` in their place. Returns the removed
    /// elements as data. Fires one update when anything changed.
    pub fn splice(&mut self, start: usize, delete_count: usize, items: Vec<D>) -> Vec<D> {
        let len = self.len();
        if start > len {
            debug!(start, len, "splice start past end clamped");
        }
        let start = start.min(len);
        let delete_count = delete_count.min(len - start);
        if delete_count == 0 && items.is_empty() {
            return Vec::new();
        }
        let removed: Vec<D> = if self.creatable {
            let replacements: Vec<I> = items.iter().map(|d| (self.binder.create)(d)).collect();
            self.instances
                .splice(start..start + delete_count, replacements)
                .map(|i| (self.binder.get_data)(&i))
                .collect()
        } else {
            self.data
                .splice(start..start + delete_count, items)
                .collect()
        };
        self.touch();
        removed
    }

    /// Shrink the collection to `len`. Growing is a no-op (with a
    /// diagnostic); an actual shrink fires one update.
    pub fn truncate(&mut self, len: usize) {
        let current = self.len();
        if len >= current {
            if len > current {
                debug!(len, current, "truncate cannot grow");
            }
            return;
        }
        if self.creatable {
            self.instances.truncate(len);
        } else {
            self.data.truncate(len);
        }
        self.touch();
    }

    /// Clear and repopulate from `items`. Fires one update.
    pub fn replace(&mut self, items: impl IntoIterator<Item = D>) {
        let len = self.len();
        let _ = self.splice(0, len, items.into_iter().collect());
    }

    /// Sort by the natural order of the data view. Fires one update.
    pub fn sort(&mut self)
    where
        D: Ord,
    {
        self.sort_by(D::cmp);
    }

    /// Sort by `compare` applied to the data view of each element (so the
    /// comparator sees `D` values in both modes). Fires one update.
    pub fn sort_by(&mut self, mut compare: impl FnMut(&D, &D) -> Ordering) {
        if self.creatable {
            let get_data = &self.binder.get_data;
            self.instances
                .sort_by(|a, b| compare(&get_data(a), &get_data(b)));
        } else {
            self.data.sort_by(|a, b| compare(a, b));
        }
        self.touch();
    }

    /// Reverse the active vector in place. Fires one update.
    pub fn reverse(&mut self) {
        if self.creatable {
            self.instances.reverse();
        } else {
            self.data.reverse();
        }
        self.touch();
    }

    /// Snapshot of the logical contents as data. This is the view backing
    /// arbitrary read-only consumption.
    #[must_use]
    pub fn to_vec(&self) -> Vec<D> {
        if self.creatable {
            self.instances
                .iter()
                .map(|i| (self.binder.get_data)(i))
                .collect()
        } else {
            self.data.clone()
        }
    }

    /// Iterate over a snapshot of the logical contents.
    pub fn iter(&self) -> std::vec::IntoIter<D> {
        self.to_vec().into_iter()
    }

    fn touch(&mut self) {
        match &mut self.update {
            UpdateSink::Silent => {}
            UpdateSink::Immediate(callback) => callback(),
            UpdateSink::Debounced(debounce) => debounce.call(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use filament_core::clock::{Clock, LabClock};
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Instance shape used throughout: a data value plus a marker proving
    /// it went through `create`.
    #[derive(Debug, Clone, PartialEq)]
    struct Widget {
        value: i32,
        generation: u32,
    }

    struct Harness {
        list: SyncList<i32, Widget>,
        updates: Rc<RefCell<usize>>,
        created: Rc<RefCell<u32>>,
    }

    fn harness(creatable: bool) -> Harness {
        let updates = Rc::new(RefCell::new(0));
        let created = Rc::new(RefCell::new(0));
        let create_count = Rc::clone(&created);
        let binder = Binder::new(
            move |value: &i32| {
                *create_count.borrow_mut() += 1;
                Widget {
                    value: *value,
                    generation: *create_count.borrow(),
                }
            },
            |widget: &Widget| widget.value,
            |widget: &mut Widget, value| widget.value = value,
        );
        let update_count = Rc::clone(&updates);
        let list = SyncListBuilder::new(binder)
            .creatable(creatable)
            .on_update(move || *update_count.borrow_mut() += 1)
            .build();
        Harness {
            list,
            updates,
            created,
        }
    }

    #[test]
    fn push_on_raw_mode_stores_data_unchanged() {
        let mut h = harness(false);
        h.list.push(7);
        assert_eq!(*h.updates.borrow(), 1);
        assert_eq!(h.list.get(0), Some(7));
        assert_eq!(h.list.data(), &[7]);
        assert!(h.list.instances().is_empty());
        assert_eq!(*h.created.borrow(), 0, "no materialization in raw mode");
    }

    #[test]
    fn toggle_creatable_materializes_in_one_batch() {
        let mut h = harness(false);
        h.list.replace([1, 2, 3]);
        let updates_before = *h.updates.borrow();

        h.list.set_creatable(true);
        assert_eq!(*h.updates.borrow(), updates_before + 1, "one update for the batch");
        assert_eq!(*h.created.borrow(), 3);
        assert!(h.list.data().is_empty());
        assert_eq!(h.list.instances().len(), 3);
        assert_eq!(h.list.to_vec(), vec![1, 2, 3]);
    }

    #[test]
    fn toggle_back_flattens_instances() {
        let mut h = harness(true);
        h.list.replace([4, 5]);
        h.list.set_creatable(false);
        assert_eq!(h.list.data(), &[4, 5]);
        assert!(h.list.instances().is_empty());
    }

    #[test]
    fn set_creatable_to_current_mode_is_noop() {
        let mut h = harness(false);
        h.list.push(1);
        let updates_before = *h.updates.borrow();
        h.list.set_creatable(false);
        assert_eq!(*h.updates.borrow(), updates_before);
    }

    #[test]
    fn callers_see_data_shapes_in_creatable_mode() {
        let mut h = harness(true);
        h.list.push(10);
        h.list.push(20);
        assert_eq!(*h.created.borrow(), 2);
        assert_eq!(h.list.get(0), Some(10));
        assert_eq!(h.list.pop(), Some(20));
        assert_eq!(h.list.shift(), Some(10));
        assert!(h.list.is_empty());
    }

    #[test]
    fn set_in_bounds_updates_in_place_without_recreating() {
        let mut h = harness(true);
        h.list.push(1);
        let generation_before = h.list.instances()[0].generation;
        h.list.set(0, 99);
        assert_eq!(h.list.get(0), Some(99));
        assert_eq!(
            h.list.instances()[0].generation,
            generation_before,
            "set_data must mutate the existing instance"
        );
    }

    #[test]
    fn set_at_len_appends_and_past_len_clamps() {
        let mut h = harness(false);
        h.list.set(0, 1);
        h.list.set(7, 2);
        assert_eq!(h.list.data(), &[1, 2]);
        assert_eq!(*h.updates.borrow(), 2);
    }

    #[test]
    fn truncate_shrinks_only() {
        let mut h = harness(false);
        h.list.replace([1, 2, 3]);
        let updates_before = *h.updates.borrow();
        h.list.truncate(9);
        assert_eq!(*h.updates.borrow(), updates_before, "grow is a no-op");
        h.list.truncate(1);
        assert_eq!(h.list.data(), &[1]);
        assert_eq!(*h.updates.borrow(), updates_before + 1);
    }

    #[test]
    fn splice_returns_removed_data_in_both_modes() {
        for creatable in [false, true] {
            let mut h = harness(creatable);
            h.list.replace([1, 2, 3, 4]);
            let removed = h.list.splice(1, 2, vec![9]);
            assert_eq!(removed, vec![2, 3], "creatable={creatable}");
            assert_eq!(h.list.to_vec(), vec![1, 9, 4], "creatable={creatable}");
        }
    }

    #[test]
    fn splice_clamps_start_and_count() {
        let mut h = harness(false);
        h.list.replace([1, 2]);
        let removed = h.list.splice(10, 10, vec![3]);
        assert!(removed.is_empty());
        assert_eq!(h.list.data(), &[1, 2, 3]);
    }

    #[test]
    fn empty_splice_fires_no_update() {
        let mut h = harness(false);
        h.list.replace([1]);
        let updates_before = *h.updates.borrow();
        let removed = h.list.splice(0, 0, vec![]);
        assert!(removed.is_empty());
        assert_eq!(*h.updates.borrow(), updates_before);
    }

    #[test]
    fn each_structural_op_fires_exactly_one_update() {
        let mut h = harness(true);
        let count = || *h.updates.borrow();

        h.list.push(3);
        assert_eq!(count(), 1);
        h.list.unshift(1);
        assert_eq!(count(), 2);
        h.list.set(1, 2);
        assert_eq!(count(), 3);
        h.list.reverse();
        assert_eq!(count(), 4);
        h.list.sort();
        assert_eq!(count(), 5);
        h.list.pop();
        assert_eq!(count(), 6);
        h.list.shift();
        assert_eq!(count(), 7);
    }

    #[test]
    fn pop_on_empty_fires_no_update() {
        let mut h = harness(false);
        assert_eq!(h.list.pop(), None);
        assert_eq!(h.list.shift(), None);
        assert_eq!(*h.updates.borrow(), 0);
    }

    #[test]
    fn sort_compares_data_views_in_creatable_mode() {
        let mut h = harness(true);
        h.list.replace([3, 1, 2]);
        h.list.sort();
        assert_eq!(h.list.to_vec(), vec![1, 2, 3]);
        // Instances were reordered, not rebuilt.
        assert_eq!(*h.created.borrow(), 3);
    }

    #[test]
    fn sort_by_custom_comparator() {
        let mut h = harness(false);
        h.list.replace([1, 3, 2]);
        h.list.sort_by(|a, b| b.cmp(a));
        assert_eq!(h.list.data(), &[3, 2, 1]);
    }

    #[test]
    fn reverse_in_both_modes() {
        for creatable in [false, true] {
            let mut h = harness(creatable);
            h.list.replace([1, 2, 3]);
            h.list.reverse();
            assert_eq!(h.list.to_vec(), vec![3, 2, 1], "creatable={creatable}");
        }
    }

    #[test]
    fn replace_swaps_contents_with_one_update() {
        let mut h = harness(false);
        h.list.replace([1, 2]);
        let updates_before = *h.updates.borrow();
        h.list.replace([8, 9, 10]);
        assert_eq!(h.list.data(), &[8, 9, 10]);
        assert_eq!(*h.updates.borrow(), updates_before + 1);
    }

    #[test]
    fn iter_yields_snapshot() {
        let mut h = harness(true);
        h.list.replace([1, 2]);
        let snapshot: Vec<i32> = h.list.iter().collect();
        assert_eq!(snapshot, vec![1, 2]);
    }

    #[test]
    fn debounced_updates_coalesce() {
        let lab = LabClock::new();
        let sched = Scheduler::new(Clock::lab(&lab));
        let updates = Rc::new(RefCell::new(0));
        let update_count = Rc::clone(&updates);
        let binder = Binder::new(
            |value: &i32| *value,
            |instance: &i32| *instance,
            |instance: &mut i32, value| *instance = value,
        );
        let mut list: SyncList<i32, i32> = SyncListBuilder::new(binder)
            .on_update(move || *update_count.borrow_mut() += 1)
            .update_delay(&sched, Duration::from_millis(20))
            .build();

        list.push(1);
        list.push(2);
        list.reverse();
        assert_eq!(*updates.borrow(), 0, "nothing fires inside the burst");

        sched.advance(Duration::from_millis(20));
        assert_eq!(*updates.borrow(), 1, "one callback for the whole burst");

        list.pop();
        sched.advance(Duration::from_millis(20));
        assert_eq!(*updates.borrow(), 2);
    }

    #[test]
    fn inactive_vector_stays_empty_through_mixed_ops() {
        let mut h = harness(true);
        h.list.push(1);
        h.list.splice(0, 1, vec![2, 3]);
        h.list.unshift(0);
        h.list.sort();
        h.list.truncate(2);
        assert!(h.list.data().is_empty());
        assert_eq!(h.list.instances().len(), h.list.len());

        h.list.set_creatable(false);
        h.list.push(9);
        h.list.reverse();
        assert!(h.list.instances().is_empty());
        assert_eq!(h.list.data().len(), h.list.len());
    }
}
