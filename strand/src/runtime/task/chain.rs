use super::{CompletionSource, Task};
use crate::error::{BoxError, Error, Result};
use crate::runtime::Executor;

use std::panic::{self, AssertUnwindSafe};

impl<T> Task<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Registers `f` to receive the outcome once the task resolves.
    ///
    /// `f` runs on whichever thread resolves the task, or immediately on the
    /// calling thread if it already has. It occupies the task's single
    /// continuation slot.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyHasWaiter`] if a continuation is already
    /// waiting on this task.
    pub fn on_settled<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(Result<T>) + Send + 'static,
    {
        let shared = self.shared.clone();

        self.shared.register(Box::new(move || {
            if let Some(outcome) = shared.outcome() {
                f(outcome.clone());
            }
        }))
    }

    /// Runs `f` on `executor` with the task's value.
    ///
    /// If the task fails, `f` is never invoked and the returned task fails
    /// with the same error. If `executor` has stopped, the returned task
    /// fails with [`Error::ExecutorStopped`].
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// let text = executor
    ///     .spawn(move || i * i)
    ///     .then(&executor, |square| square.to_string());
    /// ```
    pub fn then<U, F>(&self, executor: &Executor, f: F) -> Task<U>
    where
        U: Send + Sync + 'static,
        F: FnOnce(T) -> U + Send + 'static,
    {
        self.chain(executor, move |value| Ok(f(value)))
    }

    /// Like [`then`](Self::then), with a fallible `f`.
    ///
    /// An `Err` from `f` fails the returned task with
    /// [`Error::TaskFailure`].
    pub fn try_then<U, E, F>(&self, executor: &Executor, f: F) -> Task<U>
    where
        U: Send + Sync + 'static,
        E: Into<BoxError>,
        F: FnOnce(T) -> Result<U, E> + Send + 'static,
    {
        self.chain(executor, move |value| f(value).map_err(Error::task))
    }

    /// Runs `f` on `executor` and follows the task it returns.
    ///
    /// This is the sequential "await this, then await that" step: the
    /// returned task resolves with the outcome of the task produced by `f`.
    pub fn and_then<U, F>(&self, executor: &Executor, f: F) -> Task<U>
    where
        U: Clone + Send + Sync + 'static,
        F: FnOnce(T) -> Task<U> + Send + 'static,
    {
        self.then(executor, f).flatten()
    }

    /// Transforms the value on the thread that resolves the task.
    ///
    /// No executor is involved: `f` runs inline, so it should be short.
    pub fn map<U, F>(&self, f: F) -> Task<U>
    where
        U: Send + Sync + 'static,
        F: FnOnce(T) -> U + Send + 'static,
    {
        let next = CompletionSource::with_executor(self.executor().cloned());
        let task = next.task();
        let sink = next.clone();

        let registered = self.on_settled(move |outcome| {
            let mapped = outcome.and_then(|value| {
                panic::catch_unwind(AssertUnwindSafe(|| f(value))).map_err(Error::from_panic)
            });
            let _ = sink.settle(mapped);
        });

        if let Err(error) = registered {
            let _ = next.fail(error);
        }

        task
    }

    /// Resolves `sink` with this task's outcome.
    pub(crate) fn forward(&self, sink: CompletionSource<T>) {
        let target = sink.clone();

        if let Err(error) = self.on_settled(move |outcome| {
            let _ = target.settle(outcome);
        }) {
            let _ = sink.fail(error);
        }
    }

    fn chain<U, F>(&self, executor: &Executor, f: F) -> Task<U>
    where
        U: Send + Sync + 'static,
        F: FnOnce(T) -> Result<U> + Send + 'static,
    {
        let next = CompletionSource::bound(executor.clone());
        let task = next.task();
        let sink = next.clone();
        let executor = executor.clone();

        let registered = self.on_settled(move |outcome| match outcome {
            Ok(value) => executor.execute_into(sink, move || f(value)),
            Err(error) => {
                let _ = sink.fail(error);
            }
        });

        if let Err(error) = registered {
            tracing::warn!(%error, "failed to chain continuation");
            let _ = next.fail(error);
        }

        task
    }
}

impl<T> Task<Task<T>>
where
    T: Clone + Send + Sync + 'static,
{
    /// Follows the inner task once the outer one resolves.
    pub fn flatten(&self) -> Task<T> {
        let next = CompletionSource::with_executor(self.executor().cloned());
        let task = next.task();
        let sink = next.clone();

        let registered = self.on_settled(move |outcome| match outcome {
            Ok(inner) => inner.forward(sink),
            Err(error) => {
                let _ = sink.fail(error);
            }
        });

        if let Err(error) = registered {
            let _ = next.fail(error);
        }

        task
    }
}
