use super::executor::core::Executor;
use crate::error::Result;

use std::ops::Deref;

/// Owner of a fixed-size pool of worker threads.
///
/// `ThreadPool` is responsible for:
/// - starting the worker threads,
/// - handing out [`Executor`] handles used to submit work,
/// - stopping and joining the workers when dropped.
///
/// Dropping the pool drains it: queued work finishes before the drop
/// returns. Call [`Executor::shutdown`] with `drain = false` first to
/// abandon queued work instead.
///
/// `ThreadPool` dereferences to its [`Executor`].
pub struct ThreadPool {
    /// Submission handle shared with every clone handed out.
    executor: Executor,
}

impl ThreadPool {
    /// Creates a new pool.
    ///
    /// # Arguments
    ///
    /// * `worker_threads` - Number of worker threads.
    /// * `thread_name` - Prefix of the worker thread names.
    pub(crate) fn new(worker_threads: usize, thread_name: &str) -> Result<Self> {
        let executor = Executor::start(worker_threads, thread_name)?;

        Ok(Self { executor })
    }

    /// Returns the pool's executor handle.
    pub fn executor(&self) -> &Executor {
        &self.executor
    }
}

impl Deref for ThreadPool {
    type Target = Executor;

    fn deref(&self) -> &Executor {
        &self.executor
    }
}

impl Drop for ThreadPool {
    /// Shuts the pool down, letting queued work finish first.
    fn drop(&mut self) {
        self.executor.shutdown(true);
    }
}
