use crate::error::{Error, Result};
use crate::runtime::Executor;
use crate::runtime::task::{CompletionSource, Task};
use crate::time::{TimerService, sleep};

use std::panic::{self, AssertUnwindSafe};
use std::time::Duration;

/// Retries the task produced by `factory` up to `times` extra times.
///
/// Nothing runs until [`Retry::run`] is called. Attempts after the first
/// are launched on `executor`.
///
/// Failures that retrying cannot fix are returned immediately: programming
/// errors (see [`Error::is_programming_error`]) and
/// [`Error::ExecutorStopped`].
///
/// # Examples
///
/// ```rust,ignore
/// let task = retry(&executor, 3, move || executor.try_spawn(fetch))
///     .set_interval(&timers, Duration::from_millis(50))
///     .run();
/// ```
pub fn retry<T, G>(executor: &Executor, times: usize, factory: G) -> Retry<G>
where
    T: Clone + Send + Sync + 'static,
    G: FnMut() -> Task<T> + Send + 'static,
{
    Retry {
        executor: executor.clone(),
        factory,
        remaining: times,
        interval: None,
    }
}

/// A pending retry loop. See [`retry`].
pub struct Retry<G> {
    executor: Executor,
    factory: G,

    /// Attempts left after the current one.
    remaining: usize,

    /// Pause between attempts, on the given timers.
    interval: Option<(TimerService, Duration)>,
}

impl<G> Retry<G> {
    /// Waits `interval` on `timers` before each new attempt.
    pub fn set_interval(mut self, timers: &TimerService, interval: Duration) -> Self {
        self.interval = (!interval.is_zero()).then(|| (timers.clone(), interval));
        self
    }
}

impl<T, G> Retry<G>
where
    T: Clone + Send + Sync + 'static,
    G: FnMut() -> Task<T> + Send + 'static,
{
    /// Starts the first attempt on the calling thread.
    ///
    /// The returned task resolves with the first success, or with the last
    /// failure once no attempts remain.
    pub fn run(self) -> Task<T> {
        let output = CompletionSource::bound(self.executor.clone());
        let task = output.task();
        self.attempt(output);
        task
    }

    fn attempt(mut self, output: CompletionSource<T>) {
        let launched = panic::catch_unwind(AssertUnwindSafe(|| (self.factory)()))
            .map_err(Error::from_panic);

        let attempt = match launched {
            Ok(attempt) => attempt,
            Err(error) => return self.settled(output, Err(error)),
        };

        let fallback = output.clone();
        if let Err(error) = attempt.on_settled(move |outcome| self.settled(output, outcome)) {
            let _ = fallback.fail(error);
        }
    }

    fn settled(mut self, output: CompletionSource<T>, outcome: Result<T>) {
        let error = match outcome {
            Ok(value) => {
                let _ = output.complete(value);
                return;
            }
            Err(error) => error,
        };

        if self.remaining == 0 || !retryable(&error) {
            let _ = output.fail(error);
            return;
        }

        self.remaining -= 1;
        tracing::debug!(remaining = self.remaining, %error, "retrying");

        let Some((timers, interval)) = self.interval.clone() else {
            return self.relaunch(output);
        };

        let fallback = output.clone();
        let registered = sleep(&timers, interval).on_settled(move |slept| match slept {
            Ok(()) => self.relaunch(output),
            Err(error) => {
                let _ = output.fail(error);
            }
        });

        if let Err(error) = registered {
            let _ = fallback.fail(error);
        }
    }

    fn relaunch(self, output: CompletionSource<T>) {
        let executor = self.executor.clone();
        let fallback = output.clone();

        if let Err(error) = executor.submit(move || self.attempt(output)) {
            let _ = fallback.fail(error);
        }
    }
}

fn retryable(error: &Error) -> bool {
    !error.is_programming_error() && !matches!(error, Error::ExecutorStopped)
}
