use super::Task;
use crate::error::{Error, Result};
use crate::runtime::Executor;
use crate::utils::{lock, wait, wait_timeout};

use std::fmt;
use std::mem;
use std::sync::{Arc, Condvar, Mutex, OnceLock};
use std::task::Poll;
use std::time::{Duration, Instant};

/// A one-shot callback run when a source resolves.
pub(crate) type Continuation = Box<dyn FnOnce() + Send + 'static>;

/// The continuation slot of a source.
enum Waiter {
    /// No continuation registered yet.
    Empty,

    /// A continuation is stored and will run on resolution.
    Waiting(Continuation),

    /// A continuation has been run.
    Fired,
}

/// State shared between a completion source and the tasks reading it.
///
/// The outcome is written once and never modified afterwards, so readers
/// access it without locking. The mutex only guards the continuation
/// handoff.
pub(crate) struct Shared<T> {
    /// The resolved outcome, set exactly once.
    outcome: OnceLock<Result<T>>,

    /// Continuation slot. Also the lock paired with `resolved`.
    waiter: Mutex<Waiter>,

    /// Signalled on resolution for threads blocked in [`Shared::wait`].
    resolved: Condvar,
}

impl<T> Shared<T> {
    fn new() -> Self {
        Self {
            outcome: OnceLock::new(),
            waiter: Mutex::new(Waiter::Empty),
            resolved: Condvar::new(),
        }
    }

    /// Stores the outcome and takes the registered continuation, if any.
    ///
    /// The outcome is published before the slot is inspected. A concurrent
    /// [`register`](Self::register) either finds the continuation slot
    /// still empty and the outcome set, or stores its continuation before
    /// this call takes it: exactly one side runs it.
    fn resolve(&self, outcome: Result<T>) -> Result<Option<Continuation>> {
        self.outcome
            .set(outcome)
            .map_err(|_| Error::AlreadyCompleted)?;

        let mut waiter = lock(&self.waiter);
        self.resolved.notify_all();

        match mem::replace(&mut *waiter, Waiter::Empty) {
            Waiter::Waiting(continuation) => {
                *waiter = Waiter::Fired;
                Ok(Some(continuation))
            }
            other => {
                *waiter = other;
                Ok(None)
            }
        }
    }

    /// Registers the single continuation.
    ///
    /// If the outcome is already available the continuation runs right away
    /// on the calling thread.
    pub(crate) fn register(&self, continuation: Continuation) -> Result<()> {
        let mut waiter = lock(&self.waiter);

        if let Waiter::Waiting(_) = *waiter {
            return Err(Error::AlreadyHasWaiter);
        }

        if self.outcome.get().is_some() {
            *waiter = Waiter::Fired;
            drop(waiter);
            continuation();
            return Ok(());
        }

        *waiter = Waiter::Waiting(continuation);
        Ok(())
    }

    pub(crate) fn outcome(&self) -> Option<&Result<T>> {
        self.outcome.get()
    }

    pub(crate) fn poll(&self) -> Poll<Result<&T, &Error>> {
        match self.outcome.get() {
            Some(outcome) => Poll::Ready(outcome.as_ref()),
            None => Poll::Pending,
        }
    }

    /// Blocks until the outcome is available.
    pub(crate) fn wait(&self) -> &Result<T> {
        let mut waiter = lock(&self.waiter);

        loop {
            if let Some(outcome) = self.outcome.get() {
                return outcome;
            }
            waiter = wait(&self.resolved, waiter);
        }
    }

    /// Blocks until the outcome is available or `timeout` elapses.
    pub(crate) fn wait_timeout(&self, timeout: Duration) -> Option<&Result<T>> {
        let deadline = Instant::now() + timeout;
        let mut waiter = lock(&self.waiter);

        loop {
            if let Some(outcome) = self.outcome.get() {
                return Some(outcome);
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return None;
            }
            waiter = wait_timeout(&self.resolved, waiter, remaining);
        }
    }
}

/// A single-assignment slot for a deferred result.
///
/// The source is the write side of a [`Task`]: whoever starts an
/// asynchronous operation creates a source, hands out [`task`](Self::task)
/// to consumers, and later resolves it with [`complete`](Self::complete) or
/// [`fail`](Self::fail).
///
/// - The source resolves exactly once. Any later attempt fails with
///   [`Error::AlreadyCompleted`] and leaves the first outcome untouched.
/// - At most one continuation may wait on it. It runs exactly once, either
///   on the resolving thread or, when registered after resolution, on the
///   registering thread.
///
/// Cloning a source yields another writer for the same slot. Racing writers
/// are allowed; the single-assignment rule picks the winner.
///
/// # Examples
///
/// ```rust,ignore
/// let source = CompletionSource::new();
/// let task = source.task();
///
/// std::thread::spawn(move || source.complete(42));
///
/// assert_eq!(task.wait()?, 42);
/// ```
pub struct CompletionSource<T> {
    shared: Arc<Shared<T>>,
    executor: Option<Executor>,
}

impl<T> CompletionSource<T>
where
    T: Send + Sync + 'static,
{
    /// Creates a pending source not bound to any executor.
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared::new()),
            executor: None,
        }
    }

    /// Creates a pending source whose tasks report `executor` as provenance.
    pub fn bound(executor: Executor) -> Self {
        Self {
            shared: Arc::new(Shared::new()),
            executor: Some(executor),
        }
    }

    pub(crate) fn with_executor(executor: Option<Executor>) -> Self {
        Self {
            shared: Arc::new(Shared::new()),
            executor,
        }
    }

    /// Returns a task reading this source.
    pub fn task(&self) -> Task<T> {
        Task::from_parts(self.shared.clone(), self.executor.clone())
    }

    /// Resolves the source with `value`.
    ///
    /// The registered continuation, if any, runs on the calling thread
    /// before this returns. Use [`complete_on`](Self::complete_on) when the
    /// calling thread must not run it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyCompleted`] if the source was already resolved.
    pub fn complete(&self, value: T) -> Result<()> {
        self.settle(Ok(value))
    }

    /// Fails the source with `error`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyCompleted`] if the source was already resolved.
    pub fn fail(&self, error: Error) -> Result<()> {
        self.settle(Err(error))
    }

    /// Resolves the source from `outcome`.
    pub fn settle(&self, outcome: Result<T>) -> Result<()> {
        if let Some(continuation) = self.shared.resolve(outcome)? {
            tracing::trace!("running continuation inline");
            continuation();
        }
        Ok(())
    }

    /// Resolves the source with `value`, handing the continuation to
    /// `executor`.
    pub fn complete_on(&self, executor: &Executor, value: T) -> Result<()> {
        self.settle_on(executor, Ok(value))
    }

    /// Fails the source with `error`, handing the continuation to
    /// `executor`.
    pub fn fail_on(&self, executor: &Executor, error: Error) -> Result<()> {
        self.settle_on(executor, Err(error))
    }

    /// Resolves the source from `outcome`, handing the continuation to
    /// `executor`.
    ///
    /// If the executor has stopped, the continuation runs inline instead.
    pub fn settle_on(&self, executor: &Executor, outcome: Result<T>) -> Result<()> {
        if let Some(continuation) = self.shared.resolve(outcome)? {
            executor.dispatch(continuation);
        }
        Ok(())
    }

    /// Returns the current state without blocking.
    pub fn poll(&self) -> Poll<Result<&T, &Error>> {
        self.shared.poll()
    }

    /// Returns `true` once the source has been resolved.
    pub fn is_completed(&self) -> bool {
        self.shared.outcome().is_some()
    }

    /// Registers the continuation to run on resolution.
    ///
    /// If the source is already resolved, `continuation` runs immediately on
    /// the calling thread.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyHasWaiter`] if another continuation is stored
    /// and has not run yet.
    pub fn register_continuation<F>(&self, continuation: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        self.shared.register(Box::new(continuation))
    }
}

impl<T> Clone for CompletionSource<T> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
            executor: self.executor.clone(),
        }
    }
}

impl<T> Default for CompletionSource<T>
where
    T: Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for CompletionSource<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self.shared.outcome() {
            None => "pending",
            Some(Ok(_)) => "ready",
            Some(Err(_)) => "failed",
        };

        f.debug_struct("CompletionSource")
            .field("state", &state)
            .finish()
    }
}
