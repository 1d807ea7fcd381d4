#![forbid(unsafe_code)]

//! Filament public facade crate.
//!
//! This crate provides the stable, ergonomic surface area for users.

pub mod prelude {
    pub use filament_collections as collections;
    pub use filament_core as core;

    pub use filament_collections::{
        Binder, ObservedMap, ObservedVec, SyncList, SyncListBuilder, WeakSet,
    };
    pub use filament_core::{
        Clock, Completion, Debounce, Event, Events, Handler, LabClock, Payload, Scheduler,
        SerialCallbackExecutor, SerialExecutor, TargetId, TaskError, Throttle, Ticket,
        TimerHandle, handler,
    };
}
