#![forbid(unsafe_code)]

//! Debounce and throttle: coalesce bursts of calls into timed invocations.
//!
//! Both types own one function, one delay, at most one armed timer, and the
//! most recently recorded argument. They differ in what a call during the
//! pending window does:
//!
//! - [`Debounce`] re-arms the timer on every call; only the last call before
//!   the deadline is honored.
//! - [`Throttle`] keeps the original deadline (fixed cadence) but still
//!   records the freshest argument, which is the one used at fire time. This
//!   freshest-args behavior is deliberate; call sites depend on it, so a
//!   conventional first-args throttle is not a valid substitute.
//!
//! # Invariants
//!
//! 1. At most one timer registration is pending per instance, ever.
//! 2. Re-arming cancels the previous registration before arming the next.
//! 3. After [`cancel`](Debounce::cancel), nothing fires until the next call.

use std::cell::RefCell;
use std::rc::Rc;

use web_time::Duration;

use crate::scheduler::{Scheduler, TimerHandle};

struct Pending<A> {
    args: Option<A>,
    timer: Option<TimerHandle>,
}

/// Collapse a burst of calls into one delayed invocation using the last
/// call's argument.
pub struct Debounce<A> {
    scheduler: Scheduler,
    delay: Duration,
    func: Rc<RefCell<dyn FnMut(A)>>,
    pending: Rc<RefCell<Pending<A>>>,
}

impl<A: 'static> std::fmt::Debug for Debounce<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Debounce")
            .field("delay", &self.delay)
            .field("pending", &self.is_pending())
            .finish()
    }
}

impl<A: 'static> Debounce<A> {
    /// Create a debouncer that invokes `func` on the given scheduler `delay`
    /// after the most recent [`call`](Self::call).
    pub fn new(scheduler: &Scheduler, delay: Duration, func: impl FnMut(A) + 'static) -> Self {
        Self {
            scheduler: scheduler.clone(),
            delay,
            func: Rc::new(RefCell::new(func)),
            pending: Rc::new(RefCell::new(Pending {
                args: None,
                timer: None,
            })),
        }
    }

    /// Record `args` and (re)start the delay timer. Only the last call
    /// before the deadline has its argument honored.
    pub fn call(&self, args: A) {
        self.disarm();
        self.pending.borrow_mut().args = Some(args);
        self.arm();
    }

    /// Restart the timer using the argument recorded by the last call.
    /// No-op when nothing is recorded.
    pub fn refire(&self) {
        if self.pending.borrow().args.is_none() {
            return;
        }
        self.disarm();
        self.arm();
    }

    /// Cancel the pending timer without invoking the function. The recorded
    /// argument is kept so [`refire`](Self::refire) still works.
    pub fn cancel(&self) {
        self.disarm();
    }

    /// Whether a timer is currently armed.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.borrow().timer.is_some()
    }

    fn disarm(&self) {
        if let Some(handle) = self.pending.borrow_mut().timer.take() {
            self.scheduler.cancel_timer(&handle);
        }
    }

    fn arm(&self) {
        let pending = Rc::clone(&self.pending);
        let func = Rc::clone(&self.func);
        let handle = self.scheduler.set_timer(self.delay, move || {
            let args = {
                let mut p = pending.borrow_mut();
                p.timer = None;
                p.args.take()
            };
            if let Some(args) = args {
                (func.borrow_mut())(args);
            }
        });
        self.pending.borrow_mut().timer = Some(handle);
    }
}

/// Rate-limit invocation to at most once per delay window, preferring the
/// freshest recorded argument.
pub struct Throttle<A> {
    scheduler: Scheduler,
    delay: Duration,
    func: Rc<RefCell<dyn FnMut(A)>>,
    pending: Rc<RefCell<Pending<A>>>,
}

impl<A: 'static> std::fmt::Debug for Throttle<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Throttle")
            .field("delay", &self.delay)
            .field("pending", &self.is_pending())
            .finish()
    }
}

impl<A: 'static> Throttle<A> {
    /// Create a throttle that invokes `func` at most once per `delay`.
    pub fn new(scheduler: &Scheduler, delay: Duration, func: impl FnMut(A) + 'static) -> Self {
        Self {
            scheduler: scheduler.clone(),
            delay,
            func: Rc::new(RefCell::new(func)),
            pending: Rc::new(RefCell::new(Pending {
                args: None,
                timer: None,
            })),
        }
    }

    /// Record `args`; arm a timer only when none is pending. Calls landing
    /// during the pending window update the argument used at fire time but
    /// do not extend the deadline.
    pub fn call(&self, args: A) {
        let armed = {
            let mut p = self.pending.borrow_mut();
            p.args = Some(args);
            p.timer.is_some()
        };
        if armed {
            return;
        }
        let pending = Rc::clone(&self.pending);
        let func = Rc::clone(&self.func);
        let handle = self.scheduler.set_timer(self.delay, move || {
            let args = {
                let mut p = pending.borrow_mut();
                p.timer = None;
                p.args.take()
            };
            if let Some(args) = args {
                (func.borrow_mut())(args);
            }
        });
        self.pending.borrow_mut().timer = Some(handle);
    }

    /// Cancel the pending window without invoking the function.
    pub fn cancel(&self) {
        let mut p = self.pending.borrow_mut();
        p.args = None;
        if let Some(handle) = p.timer.take() {
            self.scheduler.cancel_timer(&handle);
        }
    }

    /// Whether a window is currently open.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.borrow().timer.is_some()
    }
}
