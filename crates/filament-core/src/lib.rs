#![forbid(unsafe_code)]

//! Core: cooperative scheduling, timed invocation, serial execution, and the
//! typed event model for Filament.
//!
//! Everything here is single-threaded and event-loop shaped: a [`Scheduler`]
//! owns a FIFO task queue plus deadline timers, and every deferred mechanism
//! in the toolkit — event delivery, debounced updates, serial task streams —
//! routes through it. Time comes from a [`Clock`], which in tests is a
//! manually-advanced [`LabClock`] so all timing behavior is deterministic.
//!
//! [`Scheduler`]: scheduler::Scheduler
//! [`Clock`]: clock::Clock
//! [`LabClock`]: clock::LabClock

pub mod clock;
pub mod debounce;
pub mod events;
pub mod outcome;
pub mod scheduler;
pub mod serial;

pub use clock::{Clock, LabClock};
pub use debounce::{Debounce, Throttle};
pub use events::{Event, Events, Handler, Payload, TargetId, handler};
pub use outcome::{TaskError, call, run};
pub use scheduler::{Scheduler, TimerHandle};
pub use serial::{Completion, SerialCallbackExecutor, SerialExecutor, Ticket};
