#![forbid(unsafe_code)]

//! Safe invocation wrappers that turn failures into values.
//!
//! [`run`] and [`call`] execute a fallible closure and hand back a
//! `Result<T, TaskError>` no matter what happens inside — an `Err` is
//! normalized, and a panic is caught and converted instead of unwinding into
//! the caller. Event handlers, serial jobs, and update callbacks all funnel
//! user code through these wrappers so a misbehaving callback cannot take
//! down the scheduler.
//!
//! # Normalization
//!
//! - An error value passes through: a [`TaskError`] stays as-is, anything
//!   else becomes [`TaskError::Failure`] carrying the original as its cause.
//! - A panic with a string payload becomes [`TaskError::Message`] with that
//!   text (the payload is the message, nothing is re-thrown).
//! - A panic with any other payload becomes [`TaskError::Opaque`].

use std::error::Error;
use std::panic::{AssertUnwindSafe, catch_unwind};

use thiserror::Error;

/// Normalized failure value produced by the invocation wrappers.
#[derive(Debug, Error)]
pub enum TaskError {
    /// A plain textual failure (string-payload panics land here).
    #[error("{0}")]
    Message(String),

    /// A failure wrapping an underlying error value.
    #[error("task failed: {0}")]
    Failure(Box<dyn Error + 'static>),

    /// A failure whose payload could not be represented as text.
    #[error("task failed with a non-error value")]
    Opaque,
}

impl TaskError {
    /// A textual failure.
    #[must_use]
    pub fn msg(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }

    /// Normalize an arbitrary error value.
    ///
    /// A boxed [`TaskError`] passes through unchanged; everything else is
    /// wrapped as [`TaskError::Failure`].
    #[must_use]
    pub fn failure(err: impl Into<Box<dyn Error + 'static>>) -> Self {
        match err.into().downcast::<Self>() {
            Ok(own) => *own,
            Err(other) => Self::Failure(other),
        }
    }

    fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        if let Some(text) = payload.downcast_ref::<&str>() {
            Self::Message((*text).to_string())
        } else if let Ok(text) = payload.downcast::<String>() {
            Self::Message(*text)
        } else {
            Self::Opaque
        }
    }
}

/// Invoke `f`, converting any failure — returned or panicked — into a
/// [`TaskError`] value. Never unwinds into the caller.
pub fn run<T, E>(f: impl FnOnce() -> Result<T, E>) -> Result<T, TaskError>
where
    E: Into<Box<dyn Error + 'static>>,
{
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(TaskError::failure(err)),
        Err(payload) => Err(TaskError::from_panic(payload)),
    }
}

/// Like [`run`], with an explicit context argument standing in for a bound
/// receiver.
pub fn call<C, T, E>(ctx: &mut C, f: impl FnOnce(&mut C) -> Result<T, E>) -> Result<T, TaskError>
where
    E: Into<Box<dyn Error + 'static>>,
{
    match catch_unwind(AssertUnwindSafe(|| f(ctx))) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(TaskError::failure(err)),
        Err(payload) => Err(TaskError::from_panic(payload)),
    }
}
