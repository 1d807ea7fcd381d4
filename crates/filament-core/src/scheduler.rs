#![forbid(unsafe_code)]

//! Single-threaded cooperative scheduler: a FIFO task queue plus deadline
//! timers, drained explicitly by the owner.
//!
//! This is the loop the whole core hangs off. [`Events::emit`] defers handler
//! invocation through [`Scheduler::spawn`]; [`Debounce`]/[`Throttle`] arm
//! timers through [`Scheduler::set_timer`]; the serial executors gate their
//! queues on spawned tasks. The owner pumps the loop with
//! [`run_until_idle`](Scheduler::run_until_idle) (tasks only) or
//! [`poll`](Scheduler::poll)/[`advance`](Scheduler::advance) (tasks and due
//! timers).
//!
//! # Ordering
//!
//! 1. Tasks run strictly in spawn order.
//! 2. A task never runs inside `spawn`; execution always waits for a drain.
//! 3. The task queue is drained before any due timer fires, and again after
//!    each timer callback — work scheduled by a task always beats a timer
//!    armed in the same turn.
//! 4. Due timers fire in deadline order; ties fire in arm order.
//! 5. A cancelled or fired [`TimerHandle`] is inert; at most one live
//!    registration exists per handle.
//!
//! # Failure Modes
//!
//! - A task or timer callback that panics unwinds out of the drain call; the
//!   queue retains the remaining entries and a later drain picks them up.
//!   Callbacks that must not unwind should wrap themselves via
//!   [`crate::outcome::run`].
//!
//! [`Events::emit`]: crate::events::Events::emit
//! [`Debounce`]: crate::debounce::Debounce
//! [`Throttle`]: crate::debounce::Throttle

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use tracing::trace;
use web_time::{Duration, Instant};

use crate::clock::Clock;

type Task = Box<dyn FnOnce()>;

/// Identifies a pending timer registration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TimerHandle {
    id: u64,
}

struct TimerEntry {
    id: u64,
    seq: u64,
    deadline: Instant,
    callback: Task,
}

#[derive(Default)]
struct Inner {
    tasks: VecDeque<Task>,
    timers: Vec<TimerEntry>,
    next_id: u64,
    next_seq: u64,
}

/// Cheap-to-clone handle to the cooperative loop.
///
/// All clones share the same queues. The scheduler is single-threaded: tasks
/// and timer callbacks run on whichever call drains them.
#[derive(Clone)]
pub struct Scheduler {
    inner: Rc<RefCell<Inner>>,
    clock: Clock,
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Scheduler")
            .field("pending_tasks", &inner.tasks.len())
            .field("pending_timers", &inner.timers.len())
            .finish()
    }
}

impl Scheduler {
    /// Create a scheduler over the given time source.
    #[must_use]
    pub fn new(clock: Clock) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner::default())),
            clock,
        }
    }

    /// The scheduler's time source.
    #[must_use]
    pub fn clock(&self) -> Clock {
        self.clock.clone()
    }

    /// Enqueue a task to run on the next drain, after all earlier tasks.
    pub fn spawn(&self, task: impl FnOnce() + 'static) {
        self.inner.borrow_mut().tasks.push_back(Box::new(task));
    }

    /// Register `callback` to fire once `delay` has elapsed.
    ///
    /// The callback fires during a [`poll`](Self::poll) or
    /// [`advance`](Self::advance) whose current time has passed the deadline.
    pub fn set_timer(&self, delay: Duration, callback: impl FnOnce() + 'static) -> TimerHandle {
        let deadline = self.clock.now() + delay;
        let mut inner = self.inner.borrow_mut();
        inner.next_id += 1;
        inner.next_seq += 1;
        let id = inner.next_id;
        let seq = inner.next_seq;
        trace!(timer = id, delay_us = delay.as_micros() as u64, "arm");
        inner.timers.push(TimerEntry {
            id,
            seq,
            deadline,
            callback: Box::new(callback),
        });
        TimerHandle { id }
    }

    /// Cancel a pending timer. Returns `true` if it was still pending.
    pub fn cancel_timer(&self, handle: &TimerHandle) -> bool {
        let mut inner = self.inner.borrow_mut();
        let before = inner.timers.len();
        inner.timers.retain(|t| t.id != handle.id);
        let removed = inner.timers.len() < before;
        if removed {
            trace!(timer = handle.id, "cancel");
        }
        removed
    }

    /// Number of tasks waiting in the queue.
    #[must_use]
    pub fn pending_tasks(&self) -> usize {
        self.inner.borrow().tasks.len()
    }

    /// Number of armed timers.
    #[must_use]
    pub fn pending_timers(&self) -> usize {
        self.inner.borrow().timers.len()
    }

    /// Earliest pending timer deadline, if any.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.inner.borrow().timers.iter().map(|t| t.deadline).min()
    }

    /// Drain the task queue in FIFO order.
    ///
    /// Tasks spawned while draining run in the same drain, after all earlier
    /// tasks. Timers are untouched.
    pub fn run_until_idle(&self) {
        loop {
            let task = self.inner.borrow_mut().tasks.pop_front();
            match task {
                Some(task) => task(),
                None => break,
            }
        }
    }

    /// Drain tasks, then fire every timer whose deadline has passed.
    ///
    /// The task queue is re-drained after each timer callback, so work a
    /// timer schedules runs before the next timer fires.
    pub fn poll(&self) {
        self.fire_due(self.clock.now());
    }

    /// Advance the lab clock by `delta` (no-op for a real clock), then
    /// [`poll`](Self::poll).
    pub fn advance(&self, delta: Duration) {
        if let Some(lab) = self.clock.as_lab() {
            lab.advance(delta);
        }
        self.poll();
    }

    fn fire_due(&self, now: Instant) {
        loop {
            self.run_until_idle();
            let next = {
                let mut inner = self.inner.borrow_mut();
                let due = inner
                    .timers
                    .iter()
                    .enumerate()
                    .filter(|(_, t)| t.deadline <= now)
                    .min_by_key(|(_, t)| (t.deadline, t.seq))
                    .map(|(idx, _)| idx);
                due.map(|idx| inner.timers.swap_remove(idx))
            };
            match next {
                Some(entry) => {
                    trace!(timer = entry.id, "fire");
                    (entry.callback)();
                }
                None => break,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::LabClock;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn lab_scheduler() -> (Scheduler, LabClock) {
        let lab = LabClock::new();
        (Scheduler::new(Clock::lab(&lab)), lab)
    }

    #[test]
    fn tasks_run_in_spawn_order() {
        let (sched, _lab) = lab_scheduler();
        let log = Rc::new(RefCell::new(Vec::new()));
        for i in 0..4 {
            let log = Rc::clone(&log);
            sched.spawn(move || log.borrow_mut().push(i));
        }
        assert_eq!(log.borrow().len(), 0);
        sched.run_until_idle();
        assert_eq!(*log.borrow(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn tasks_spawned_while_draining_run_same_drain() {
        let (sched, _lab) = lab_scheduler();
        let log = Rc::new(RefCell::new(Vec::new()));
        let inner_log = Rc::clone(&log);
        let inner_sched = sched.clone();
        sched.spawn(move || {
            inner_log.borrow_mut().push("outer");
            let nested_log = Rc::clone(&inner_log);
            inner_sched.spawn(move || nested_log.borrow_mut().push("nested"));
        });
        sched.run_until_idle();
        assert_eq!(*log.borrow(), vec!["outer", "nested"]);
    }

    #[test]
    fn timer_fires_after_deadline_only() {
        let (sched, lab) = lab_scheduler();
        let fired = Rc::new(RefCell::new(false));
        let flag = Rc::clone(&fired);
        sched.set_timer(Duration::from_millis(50), move || *flag.borrow_mut() = true);

        lab.advance(Duration::from_millis(49));
        sched.poll();
        assert!(!*fired.borrow());

        lab.advance(Duration::from_millis(1));
        sched.poll();
        assert!(*fired.borrow());
        assert_eq!(sched.pending_timers(), 0);
    }

    #[test]
    fn tasks_beat_due_timers() {
        let (sched, _lab) = lab_scheduler();
        let log = Rc::new(RefCell::new(Vec::new()));

        let timer_log = Rc::clone(&log);
        sched.set_timer(Duration::ZERO, move || {
            timer_log.borrow_mut().push("timer");
        });
        let task_log = Rc::clone(&log);
        sched.spawn(move || task_log.borrow_mut().push("task"));

        sched.advance(Duration::from_millis(1));
        assert_eq!(*log.borrow(), vec!["task", "timer"]);
    }

    #[test]
    fn timer_ties_fire_in_arm_order() {
        let (sched, _lab) = lab_scheduler();
        let log = Rc::new(RefCell::new(Vec::new()));
        for i in 0..3 {
            let log = Rc::clone(&log);
            sched.set_timer(Duration::from_millis(10), move || log.borrow_mut().push(i));
        }
        sched.advance(Duration::from_millis(10));
        assert_eq!(*log.borrow(), vec![0, 1, 2]);
    }

    #[test]
    fn timers_fire_in_deadline_order_not_arm_order() {
        let (sched, _lab) = lab_scheduler();
        let log = Rc::new(RefCell::new(Vec::new()));
        let late = Rc::clone(&log);
        sched.set_timer(Duration::from_millis(20), move || late.borrow_mut().push("late"));
        let early = Rc::clone(&log);
        sched.set_timer(Duration::from_millis(5), move || early.borrow_mut().push("early"));
        sched.advance(Duration::from_millis(30));
        assert_eq!(*log.borrow(), vec!["early", "late"]);
    }

    #[test]
    fn cancelled_timer_never_fires() {
        let (sched, _lab) = lab_scheduler();
        let fired = Rc::new(RefCell::new(false));
        let flag = Rc::clone(&fired);
        let handle = sched.set_timer(Duration::from_millis(5), move || *flag.borrow_mut() = true);
        assert!(sched.cancel_timer(&handle));
        assert!(!sched.cancel_timer(&handle));
        sched.advance(Duration::from_millis(10));
        assert!(!*fired.borrow());
    }

    #[test]
    fn timer_callback_spawned_work_runs_before_next_timer() {
        let (sched, _lab) = lab_scheduler();
        let log = Rc::new(RefCell::new(Vec::new()));

        let first_log = Rc::clone(&log);
        let first_sched = sched.clone();
        sched.set_timer(Duration::from_millis(1), move || {
            first_log.borrow_mut().push("t1");
            let spawned = Rc::clone(&first_log);
            first_sched.spawn(move || spawned.borrow_mut().push("t1-task"));
        });
        let second_log = Rc::clone(&log);
        sched.set_timer(Duration::from_millis(2), move || {
            second_log.borrow_mut().push("t2");
        });

        sched.advance(Duration::from_millis(5));
        assert_eq!(*log.borrow(), vec!["t1", "t1-task", "t2"]);
    }

    #[test]
    fn timer_arming_past_deadline_fires_in_same_poll() {
        let (sched, _lab) = lab_scheduler();
        let log = Rc::new(RefCell::new(Vec::new()));
        let outer_log = Rc::clone(&log);
        let outer_sched = sched.clone();
        sched.set_timer(Duration::ZERO, move || {
            outer_log.borrow_mut().push("outer");
            let inner = Rc::clone(&outer_log);
            outer_sched.set_timer(Duration::ZERO, move || inner.borrow_mut().push("chained"));
        });
        sched.advance(Duration::from_millis(1));
        assert_eq!(*log.borrow(), vec!["outer", "chained"]);
    }

    #[test]
    fn next_deadline_reports_earliest() {
        let (sched, lab) = lab_scheduler();
        sched.set_timer(Duration::from_millis(30), || {});
        sched.set_timer(Duration::from_millis(10), || {});
        let expected = lab.now() + Duration::from_millis(10);
        assert_eq!(sched.next_deadline(), Some(expected));
    }
}
