#![forbid(unsafe_code)]

//! Time sources for the scheduler and event timestamps.
//!
//! In production, [`Clock`] reads `web_time::Instant::now()`. In tests, a
//! [`LabClock`] is advanced manually so every timer and timestamp is fully
//! deterministic — no real sleeps anywhere in the test suite.
//!
//! # Invariants
//!
//! 1. All clones of a `LabClock` observe the same time.
//! 2. `now()` is monotonically non-decreasing for both sources.

use std::cell::Cell;
use std::rc::Rc;

use web_time::{Duration, Instant};

/// A manually-advanceable clock for deterministic tests.
///
/// All [`Clock`] handles built from the same `LabClock` (and all clones of
/// it) see the same time.
#[derive(Debug, Clone)]
pub struct LabClock {
    epoch: Instant,
    offset: Rc<Cell<Duration>>,
}

impl LabClock {
    /// Create a new lab clock starting at `Instant::now()`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
            offset: Rc::new(Cell::new(Duration::ZERO)),
        }
    }

    /// Advance the lab clock by `delta`.
    pub fn advance(&self, delta: Duration) {
        self.offset.set(self.offset.get() + delta);
    }

    /// Current lab time.
    #[must_use]
    pub fn now(&self) -> Instant {
        self.epoch + self.offset.get()
    }
}

impl Default for LabClock {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
enum Source {
    /// Real wall-clock time.
    Real,
    /// Deterministic lab clock for testing.
    Lab(LabClock),
}

/// Cheap-to-clone time source handle.
#[derive(Debug, Clone)]
pub struct Clock {
    source: Source,
}

impl Clock {
    /// Wall-clock time via `web_time`.
    #[must_use]
    pub fn real() -> Self {
        Self {
            source: Source::Real,
        }
    }

    /// A clock driven by `lab`; advancing `lab` moves this clock.
    #[must_use]
    pub fn lab(lab: &LabClock) -> Self {
        Self {
            source: Source::Lab(lab.clone()),
        }
    }

    /// Current time according to the underlying source.
    #[must_use]
    pub fn now(&self) -> Instant {
        match &self.source {
            Source::Real => Instant::now(),
            Source::Lab(lab) => lab.now(),
        }
    }

    /// The lab clock backing this handle, if any.
    #[must_use]
    pub fn as_lab(&self) -> Option<&LabClock> {
        match &self.source {
            Source::Real => None,
            Source::Lab(lab) => Some(lab),
        }
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::real()
    }
}
