#![forbid(unsafe_code)]

//! Collections: array/set helpers, mutation-observing containers, a weak
//! set, and the [`SyncList`] synchronization engine.
//!
//! Everything that mutates here reports through hooks wired to
//! `filament-core`'s scheduler, so downstream consumers (widgets, render
//! code) observe coalesced, deterministic update notifications.
//!
//! [`SyncList`]: sync_list::SyncList

pub mod observed;
pub mod ops;
pub mod sync_list;
pub mod weak_set;

pub use observed::{MapChange, ObservedMap, ObservedVec, VecChange};
pub use ops::{
    are_sets_equal, index_range, range_between, range_stepped, range_to, shift, shuffle, zip2,
    zip3,
};
pub use sync_list::{Binder, SyncList, SyncListBuilder};
pub use weak_set::WeakSet;
