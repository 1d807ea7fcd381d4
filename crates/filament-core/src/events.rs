#![forbid(unsafe_code)]

//! Typed publish/subscribe with deferred, in-order delivery.
//!
//! An [`Events`] registry is declared with a fixed set of event kind names.
//! Handlers subscribe per kind, persistently ([`on`](Events::on)) or
//! one-shot ([`once`](Events::once)); [`emit`](Events::emit) never invokes
//! a handler synchronously — delivery is spawned onto the scheduler and runs
//! on the next drain. Kinds outside the declared set are accepted but inert:
//! subscribing to or emitting an undeclared kind is a silent no-op, which is
//! how "event type not enabled" is modeled.
//!
//! # Ordering
//!
//! 1. `emit` returns before any handler runs.
//! 2. For one emit: one-shot handlers first, then persistent handlers, each
//!    group in registration order.
//! 3. The one-shot set is cleared synchronously inside `emit`, so a handler
//!    registered via `once` during dispatch cannot receive an event that was
//!    already emitted.
//! 4. Handler identity is `Rc` pointer identity: registering the same
//!    handler twice for a kind has no additional effect, and
//!    [`off`](Events::off) removes by that identity from both sets.
//!
//! # Failure Modes
//!
//! - Handler panics are not caught here; they surface from the scheduler
//!   drain that delivers the event, never from `emit` itself.

use std::any::Any;
use std::rc::Rc;

use ahash::AHashMap;
use tracing::trace;
use web_time::Instant;

use crate::scheduler::Scheduler;

/// Opaque reference to the object an event concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetId(pub u64);

impl TargetId {
    /// No particular target.
    pub const NONE: Self = Self(0);
}

/// Event payload, one variant per payload kind.
#[derive(Clone)]
pub enum Payload {
    /// No payload.
    Empty,
    /// A scalar value.
    Value(f64),
    /// A key name (keyboard-style events).
    Key(String),
    /// A 2D vector (pointer-style events).
    Point { x: f64, y: f64 },
    /// A failure description.
    Error(String),
    /// Arbitrary consumer-defined details.
    Details(Rc<dyn Any>),
}

impl std::fmt::Debug for Payload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "Empty"),
            Self::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Self::Key(k) => f.debug_tuple("Key").field(k).finish(),
            Self::Point { x, y } => f.debug_struct("Point").field("x", x).field("y", y).finish(),
            Self::Error(e) => f.debug_tuple("Error").field(e).finish(),
            Self::Details(_) => write!(f, "Details(..)"),
        }
    }
}

/// Immutable event envelope: kind tag, creation instant, target, payload.
///
/// Created at emission time, delivered read-only, discarded after delivery.
#[derive(Debug, Clone)]
pub struct Event {
    /// Kind tag; must match a declared kind to be delivered.
    pub kind: &'static str,
    /// Creation instant (the registry's clock at `emit` time).
    pub timestamp: Instant,
    /// Owner reference.
    pub target: TargetId,
    /// Payload variant.
    pub payload: Payload,
}

impl Event {
    /// An event with no payload, stamped `timestamp`.
    #[must_use]
    pub fn new(kind: &'static str, timestamp: Instant) -> Self {
        Self {
            kind,
            timestamp,
            target: TargetId::NONE,
            payload: Payload::Empty,
        }
    }

    /// Attach a target reference.
    #[must_use]
    pub fn with_target(mut self, target: TargetId) -> Self {
        self.target = target;
        self
    }

    /// Attach a payload.
    #[must_use]
    pub fn with_payload(mut self, payload: Payload) -> Self {
        self.payload = payload;
        self
    }

    /// The scalar value payload, if that is what this event carries.
    #[must_use]
    pub fn value(&self) -> Option<f64> {
        match self.payload {
            Payload::Value(v) => Some(v),
            _ => None,
        }
    }

    /// The key payload, if that is what this event carries.
    #[must_use]
    pub fn key(&self) -> Option<&str> {
        match &self.payload {
            Payload::Key(k) => Some(k),
            _ => None,
        }
    }

    /// The point payload, if that is what this event carries.
    #[must_use]
    pub fn point(&self) -> Option<(f64, f64)> {
        match self.payload {
            Payload::Point { x, y } => Some((x, y)),
            _ => None,
        }
    }
}

/// Subscriber callback. Identity (for dedup and removal) is the `Rc`
/// pointer, so keep a clone of the handle you intend to pass to
/// [`Events::off`].
pub type Handler = Rc<dyn Fn(&Event)>;

/// Wrap a closure as a [`Handler`].
pub fn handler(f: impl Fn(&Event) + 'static) -> Handler {
    Rc::new(f)
}

/// Per-kind handler registry with deferred delivery.
pub struct Events {
    scheduler: Scheduler,
    persistent: AHashMap<&'static str, Vec<Handler>>,
    one_shot: AHashMap<&'static str, Vec<Handler>>,
}

impl std::fmt::Debug for Events {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Events")
            .field("kinds", &self.persistent.len())
            .finish()
    }
}

impl Events {
    /// Create a registry for the fixed set of `kinds`. The set cannot be
    /// extended later.
    #[must_use]
    pub fn new(scheduler: &Scheduler, kinds: &[&'static str]) -> Self {
        let mut persistent = AHashMap::with_capacity(kinds.len());
        let mut one_shot = AHashMap::with_capacity(kinds.len());
        for kind in kinds {
            persistent.insert(*kind, Vec::new());
            one_shot.insert(*kind, Vec::new());
        }
        Self {
            scheduler: scheduler.clone(),
            persistent,
            one_shot,
        }
    }

    /// The declared kind names.
    pub fn declared_kinds(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.persistent.keys().copied()
    }

    /// Whether any handler (persistent or one-shot) is registered for
    /// `kind`.
    #[must_use]
    pub fn has_listeners(&self, kind: &str) -> bool {
        self.persistent.get(kind).is_some_and(|h| !h.is_empty())
            || self.one_shot.get(kind).is_some_and(|h| !h.is_empty())
    }

    /// Build an event of `kind` stamped with the registry clock's current
    /// time.
    #[must_use]
    pub fn make(&self, kind: &'static str) -> Event {
        Event::new(kind, self.scheduler.clock().now())
    }

    /// Register a persistent handler. Idempotent per handler identity;
    /// undeclared kinds are ignored.
    pub fn on(&mut self, kind: &str, handler: Handler) {
        if let Some(handlers) = self.persistent.get_mut(kind) {
            if !handlers.iter().any(|h| Rc::ptr_eq(h, &handler)) {
                handlers.push(handler);
            }
        }
    }

    /// Register a one-shot handler, removed automatically after the next
    /// emit of `kind`. Idempotent per handler identity; undeclared kinds
    /// are ignored.
    pub fn once(&mut self, kind: &str, handler: Handler) {
        if let Some(handlers) = self.one_shot.get_mut(kind) {
            if !handlers.iter().any(|h| Rc::ptr_eq(h, &handler)) {
                handlers.push(handler);
            }
        }
    }

    /// Remove `handler` from both the persistent and one-shot sets of
    /// `kind`.
    pub fn off(&mut self, kind: &str, handler: &Handler) {
        if let Some(handlers) = self.persistent.get_mut(kind) {
            handlers.retain(|h| !Rc::ptr_eq(h, handler));
        }
        if let Some(handlers) = self.one_shot.get_mut(kind) {
            handlers.retain(|h| !Rc::ptr_eq(h, handler));
        }
    }

    /// Emit `event`: schedule its one-shot handlers, then its persistent
    /// handlers, onto the scheduler in registration order, and clear the
    /// one-shot set before returning. Handlers run on the next drain.
    ///
    /// Emitting a kind with no handlers — or an undeclared kind — is a
    /// no-op.
    pub fn emit(&mut self, event: Event) {
        let kind = event.kind;
        let one_shot = self
            .one_shot
            .get_mut(kind)
            .map(std::mem::take)
            .unwrap_or_default();
        let persistent = self.persistent.get(kind).cloned().unwrap_or_default();
        if one_shot.is_empty() && persistent.is_empty() {
            return;
        }
        trace!(
            kind,
            one_shot = one_shot.len(),
            persistent = persistent.len(),
            "emit"
        );
        let event = Rc::new(event);
        for handler in one_shot.into_iter().chain(persistent) {
            let event = Rc::clone(&event);
            self.scheduler.spawn(move || handler(&event));
        }
    }

    /// Convenience: emit a payload-free event of `kind` stamped now.
    pub fn emit_kind(&mut self, kind: &'static str) {
        let event = self.make(kind);
        self.emit(event);
    }
}
