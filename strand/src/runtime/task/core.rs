use super::source::Shared;
use crate::error::{Error, Result};
use crate::runtime::Executor;
use crate::runtime::context::current_worker;

use std::fmt;
use std::sync::Arc;
use std::task::Poll;
use std::time::Duration;

/// A handle to a deferred computation.
///
/// A `Task` is the read side of a [`CompletionSource`](super::CompletionSource).
/// It starts pending and resolves exactly once, to a value or an [`Error`].
/// Once resolved, the outcome can be read any number of times.
///
/// Tasks are composed with continuations rather than awaited in place: see
/// [`then`](Self::then), [`and_then`](Self::and_then) and
/// [`join_all`](super::join_all). Clones share the same source, including
/// its single continuation slot: a task feeds at most one continuation.
pub struct Task<T> {
    /// Source state shared with the writer.
    pub(crate) shared: Arc<Shared<T>>,

    /// Executor the task was created on, if any.
    executor: Option<Executor>,
}

impl<T> Task<T> {
    pub(crate) fn from_parts(shared: Arc<Shared<T>>, executor: Option<Executor>) -> Self {
        Self { shared, executor }
    }

    /// Returns `true` once the task has resolved.
    pub fn is_ready(&self) -> bool {
        self.shared.outcome().is_some()
    }

    /// Returns the current state without blocking.
    pub fn poll(&self) -> Poll<Result<&T, &Error>> {
        self.shared.poll()
    }

    /// Executor the task was created on, if any.
    pub fn executor(&self) -> Option<&Executor> {
        self.executor.as_ref()
    }
}

impl<T> Task<T>
where
    T: Send + Sync + 'static,
{
    /// Creates a task already resolved to `value`.
    pub fn ready(value: T) -> Self {
        let source = super::CompletionSource::new();
        let _ = source.complete(value);
        source.task()
    }

    /// Creates a task already failed with `error`.
    pub fn failed(error: Error) -> Self {
        let source = super::CompletionSource::new();
        let _ = source.fail(error);
        source.task()
    }
}

impl<T> Task<T>
where
    T: Clone,
{
    /// Returns a copy of the outcome, or `None` while pending.
    pub fn result(&self) -> Option<Result<T>> {
        self.shared.outcome().cloned()
    }

    /// Blocks the calling thread until the task resolves.
    ///
    /// Blocking does not use the task's continuation slot, so a task can be
    /// both chained and waited on.
    ///
    /// Waiting on a pool worker holds that worker for the whole wait; prefer
    /// chaining from inside the pool.
    pub fn wait(&self) -> Result<T> {
        if let Some(worker) = current_worker() {
            tracing::warn!(worker = worker.index(), "blocking wait on a pool worker");
        }

        self.shared.wait().clone()
    }

    /// Blocks until the task resolves or `timeout` elapses.
    ///
    /// Returns `None` on timeout.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<Result<T>> {
        self.shared.wait_timeout(timeout).cloned()
    }
}

impl<T> Clone for Task<T> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
            executor: self.executor.clone(),
        }
    }
}

impl<T> fmt::Debug for Task<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self.shared.outcome() {
            None => "pending",
            Some(Ok(_)) => "ready",
            Some(Err(_)) => "failed",
        };

        f.debug_struct("Task")
            .field("state", &state)
            .field("executor", &self.executor)
            .finish()
    }
}
