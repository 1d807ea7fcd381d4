#![forbid(unsafe_code)]

//! Serial executors: FIFO, single-flight task streams.
//!
//! A job receives its argument plus a one-shot [`Completion`] and settles it
//! whenever the work is done — synchronously, or later from a spawned task
//! or timer. The executor guarantees that jobs run strictly in submission
//! order and that the next job never starts before the previous completion
//! settles, even when the work is genuinely deferred. This is mutual
//! exclusion over the logical task stream, not just the call stack.
//!
//! [`SerialExecutor`] reports each outcome through a per-submission
//! [`Ticket`]; [`SerialCallbackExecutor`] reports every outcome through one
//! shared callback and supports batch submission.
//!
//! # Invariants
//!
//! 1. At most one job is in flight per executor.
//! 2. Submission order equals start order equals completion-report order.
//! 3. A completion settles at most once; later settles are no-ops.
//! 4. A job that drops its completion unsettled rejects the submission and
//!    the queue continues.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::outcome::TaskError;
use crate::scheduler::Scheduler;

enum Sink<T> {
    Ticket(Rc<RefCell<TicketInner<T>>>),
    Shared(Rc<RefCell<dyn FnMut(Result<T, TaskError>)>>),
}

struct TicketInner<T> {
    outcome: Option<Result<T, TaskError>>,
    settled: bool,
}

/// Caller-side handle to one submission's eventual outcome.
pub struct Ticket<T> {
    inner: Rc<RefCell<TicketInner<T>>>,
}

impl<T> std::fmt::Debug for Ticket<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ticket")
            .field("settled", &self.is_settled())
            .finish()
    }
}

impl<T> Ticket<T> {
    /// Whether the job has settled (resolved, rejected, or dropped).
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.inner.borrow().settled
    }

    /// Take the outcome if the job has settled. Returns `None` while the
    /// job is pending and after the outcome has already been taken.
    pub fn try_take(&self) -> Option<Result<T, TaskError>> {
        self.inner.borrow_mut().outcome.take()
    }
}

/// One-shot resolver handed to each job. Settling it (or dropping it
/// unsettled, which rejects) marks the job finished and lets the next
/// queued job start.
pub struct Completion<T> {
    /// `None` once settled.
    sink: Option<Sink<T>>,
    /// Continuation that releases the in-flight slot and pumps the queue.
    on_settled: Option<Box<dyn FnOnce()>>,
}

impl<T> std::fmt::Debug for Completion<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Completion")
            .field("settled", &self.sink.is_none())
            .finish()
    }
}

impl<T> Completion<T> {
    /// Settle with a success value.
    pub fn resolve(mut self, value: T) {
        self.settle(Ok(value));
    }

    /// Settle with a failure.
    pub fn reject(mut self, error: TaskError) {
        self.settle(Err(error));
    }

    fn settle(&mut self, outcome: Result<T, TaskError>) {
        let Some(sink) = self.sink.take() else {
            return;
        };
        match sink {
            Sink::Ticket(inner) => {
                let mut inner = inner.borrow_mut();
                inner.outcome = Some(outcome);
                inner.settled = true;
            }
            Sink::Shared(callback) => (callback.borrow_mut())(outcome),
        }
        if let Some(resume) = self.on_settled.take() {
            resume();
        }
    }
}

impl<T> Drop for Completion<T> {
    fn drop(&mut self) {
        if self.sink.is_some() {
            // A job that forgets to settle must not wedge the queue.
            self.settle(Err(TaskError::msg(
                "job dropped its completion before settling",
            )));
        }
    }
}

struct Queue<A, T> {
    pending: VecDeque<(A, Sink<T>)>,
    in_flight: bool,
}

type Job<A, T> = Rc<RefCell<dyn FnMut(A, Completion<T>)>>;

struct Core<A, T> {
    scheduler: Scheduler,
    job: Job<A, T>,
    queue: Rc<RefCell<Queue<A, T>>>,
}

impl<A: 'static, T: 'static> Core<A, T> {
    fn new(scheduler: &Scheduler, job: impl FnMut(A, Completion<T>) + 'static) -> Self {
        Self {
            scheduler: scheduler.clone(),
            job: Rc::new(RefCell::new(job)),
            queue: Rc::new(RefCell::new(Queue {
                pending: VecDeque::new(),
                in_flight: false,
            })),
        }
    }

    fn submit(&self, args: A, sink: Sink<T>) {
        self.queue.borrow_mut().pending.push_back((args, sink));
        pump(&self.scheduler, &self.job, &self.queue);
    }
}

/// Start the next queued job unless one is already in flight.
///
/// The job itself runs as a spawned task, so submission never executes user
/// code inline.
fn pump<A: 'static, T: 'static>(
    scheduler: &Scheduler,
    job: &Job<A, T>,
    queue: &Rc<RefCell<Queue<A, T>>>,
) {
    {
        let mut q = queue.borrow_mut();
        if q.in_flight || q.pending.is_empty() {
            return;
        }
        q.in_flight = true;
    }
    let job = Rc::clone(job);
    let queue = Rc::clone(queue);
    let scheduler = scheduler.clone();
    let runner_sched = scheduler.clone();
    runner_sched.spawn(move || {
        let entry = queue.borrow_mut().pending.pop_front();
        let Some((args, sink)) = entry else {
            queue.borrow_mut().in_flight = false;
            return;
        };
        let resume_job = Rc::clone(&job);
        let resume_queue = Rc::clone(&queue);
        let completion = Completion {
            sink: Some(sink),
            on_settled: Some(Box::new(move || {
                resume_queue.borrow_mut().in_flight = false;
                pump(&scheduler, &resume_job, &resume_queue);
            })),
        };
        (job.borrow_mut())(args, completion);
    });
}

/// FIFO single-flight executor reporting outcomes through per-submission
/// tickets.
pub struct SerialExecutor<A, T> {
    core: Core<A, T>,
}

impl<A, T> std::fmt::Debug for SerialExecutor<A, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let q = self.core.queue.borrow();
        f.debug_struct("SerialExecutor")
            .field("queued", &q.pending.len())
            .field("in_flight", &q.in_flight)
            .finish()
    }
}

impl<A: 'static, T: 'static> SerialExecutor<A, T> {
    /// Create an executor over `scheduler` running `job` for each
    /// submission.
    pub fn new(scheduler: &Scheduler, job: impl FnMut(A, Completion<T>) + 'static) -> Self {
        Self {
            core: Core::new(scheduler, job),
        }
    }

    /// Enqueue one submission; the returned ticket settles with the job's
    /// outcome.
    pub fn process(&self, args: A) -> Ticket<T> {
        let inner = Rc::new(RefCell::new(TicketInner {
            outcome: None,
            settled: false,
        }));
        self.core.submit(args, Sink::Ticket(Rc::clone(&inner)));
        Ticket { inner }
    }

    /// Number of submissions waiting to start (excludes the in-flight job).
    #[must_use]
    pub fn queued(&self) -> usize {
        self.core.queue.borrow().pending.len()
    }
}

/// FIFO single-flight executor reporting every outcome through one shared
/// callback.
pub struct SerialCallbackExecutor<A, T> {
    core: Core<A, T>,
    on_result: Rc<RefCell<dyn FnMut(Result<T, TaskError>)>>,
}

impl<A, T> std::fmt::Debug for SerialCallbackExecutor<A, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let q = self.core.queue.borrow();
        f.debug_struct("SerialCallbackExecutor")
            .field("queued", &q.pending.len())
            .field("in_flight", &q.in_flight)
            .finish()
    }
}

impl<A: 'static, T: 'static> SerialCallbackExecutor<A, T> {
    /// Create an executor whose outcomes all flow to `on_result`.
    pub fn new(
        scheduler: &Scheduler,
        job: impl FnMut(A, Completion<T>) + 'static,
        on_result: impl FnMut(Result<T, TaskError>) + 'static,
    ) -> Self {
        Self {
            core: Core::new(scheduler, job),
            on_result: Rc::new(RefCell::new(on_result)),
        }
    }

    /// Enqueue one submission.
    pub fn process(&self, args: A) {
        self.core
            .submit(args, Sink::Shared(Rc::clone(&self.on_result)));
    }

    /// Enqueue a batch in order.
    pub fn process_all(&self, batch: impl IntoIterator<Item = A>) {
        for args in batch {
            self.process(args);
        }
    }

    /// Number of submissions waiting to start (excludes the in-flight job).
    #[must_use]
    pub fn queued(&self) -> usize {
        self.core.queue.borrow().pending.len()
    }
}
