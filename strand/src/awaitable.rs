//! Bridging readiness-based operations into tasks.
//!
//! An [`Awaitable`] is anything that can report whether it is ready,
//! register a single resumption for when it becomes ready, and hand out its
//! result afterwards. [`suspend`] turns any awaitable into a [`Task`], which
//! can then be chained with [`Task::then`] and joined with
//! [`join_all`](crate::task::join_all).
//!
//! Three awaitables are provided:
//! - [`Sleep`](crate::time::Sleep), ready once a deadline passes,
//! - [`Task`] itself, ready once it resolves,
//! - [`Immediate`], ready from the start.

use crate::error::{Error, Result};
use crate::runtime::Executor;
use crate::runtime::task::{CompletionSource, Task};

use std::sync::Arc;

/// Resumption registered with [`Awaitable::on_ready`].
pub type Resume = Box<dyn FnOnce() + Send + 'static>;

/// A suspendable operation.
pub trait Awaitable: Send + Sync + 'static {
    /// The value produced once the operation is ready.
    type Output: Send + Sync + 'static;

    /// Returns `true` if the result can be taken without waiting.
    ///
    /// Must be cheap and never block.
    fn is_ready(&self) -> bool;

    /// Registers `resume` to run once the operation is ready.
    ///
    /// `resume` runs exactly once, possibly on another thread and possibly
    /// before this call returns.
    ///
    /// # Errors
    ///
    /// Fails without ever running `resume` if the resumption cannot be
    /// registered, for instance with [`Error::AlreadyHasWaiter`] or
    /// [`Error::TimerCreationFailed`].
    fn on_ready(&self, resume: Resume) -> Result<()>;

    /// Returns the result of a ready operation.
    ///
    /// Fails with [`Error::NotReady`] if called too early.
    fn take_result(&self) -> Result<Self::Output>;
}

/// An awaitable that is ready from the start.
#[derive(Debug, Clone)]
pub struct Immediate<T>(Result<T>);

impl<T> Immediate<T> {
    /// Wraps an outcome.
    pub fn new(outcome: Result<T>) -> Self {
        Self(outcome)
    }

    /// An immediate success.
    pub fn value(value: T) -> Self {
        Self(Ok(value))
    }

    /// An immediate failure.
    pub fn error(error: Error) -> Self {
        Self(Err(error))
    }
}

impl<T> Awaitable for Immediate<T>
where
    T: Clone + Send + Sync + 'static,
{
    type Output = T;

    fn is_ready(&self) -> bool {
        true
    }

    fn on_ready(&self, resume: Resume) -> Result<()> {
        resume();
        Ok(())
    }

    fn take_result(&self) -> Result<T> {
        self.0.clone()
    }
}

impl<T> Awaitable for Task<T>
where
    T: Clone + Send + Sync + 'static,
{
    type Output = T;

    fn is_ready(&self) -> bool {
        Task::is_ready(self)
    }

    /// Uses the task's continuation slot.
    fn on_ready(&self, resume: Resume) -> Result<()> {
        self.shared.register(resume)
    }

    fn take_result(&self) -> Result<T> {
        self.result().unwrap_or(Err(Error::NotReady))
    }
}

/// Turns an awaitable into a task.
///
/// If the awaitable is already ready the task is resolved before this
/// returns. Otherwise a single resumption is registered, and the task
/// resolves with [`Awaitable::take_result`] when it runs. A registration
/// failure fails the task right away.
///
/// Continuations attached to the task run on whichever thread resumes it;
/// for a [`Sleep`](crate::time::Sleep) that is the timer thread. Use
/// [`suspend_on`] to move them to a pool instead.
///
/// # Examples
///
/// ```rust,ignore
/// let task = suspend(timers.sleep(Duration::from_millis(100)))
///     .then(&executor, |()| "woke up");
/// ```
pub fn suspend<A>(awaitable: A) -> Task<A::Output>
where
    A: Awaitable,
{
    bridge(awaitable, None)
}

/// Like [`suspend`], handing the task's continuation to `executor`.
///
/// The thread that resumes the awaitable only queues the continuation, so
/// a slow `map` or `on_settled` never holds up the timer thread. If the
/// executor has stopped, the continuation runs inline.
pub fn suspend_on<A>(executor: &Executor, awaitable: A) -> Task<A::Output>
where
    A: Awaitable,
{
    bridge(awaitable, Some(executor.clone()))
}

fn bridge<A>(awaitable: A, executor: Option<Executor>) -> Task<A::Output>
where
    A: Awaitable,
{
    let source = CompletionSource::with_executor(executor.clone());
    let task = source.task();

    if awaitable.is_ready() {
        let _ = source.settle(awaitable.take_result());
        return task;
    }

    let awaitable = Arc::new(awaitable);
    let resumed = awaitable.clone();
    let writer = source.clone();

    let registered = awaitable.on_ready(Box::new(move || {
        let outcome = resumed.take_result();
        let _ = match &executor {
            Some(executor) => writer.settle_on(executor, outcome),
            None => writer.settle(outcome),
        };
    }));

    if let Err(error) = registered {
        tracing::trace!(%error, "suspension could not be registered");
        let _ = source.fail(error);
    }

    task
}
