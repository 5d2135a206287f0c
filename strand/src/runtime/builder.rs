use super::ThreadPool;
use crate::error::Result;

use std::num::NonZeroUsize;
use std::thread;

/// Configuration for a [`ThreadPool`].
///
/// The pool size is fixed at build time; there is no growing or shrinking
/// afterwards.
///
/// # Examples
///
/// ```rust,ignore
/// let pool = ThreadPoolBuilder::new()
///     .worker_threads(4)
///     .build()?;
/// ```
#[derive(Debug, Clone)]
pub struct ThreadPoolBuilder {
    worker_threads: usize,

    /// Workers are named `{thread_name}-{index}`.
    thread_name: String,
}

impl ThreadPoolBuilder {
    /// Starts from one worker per available CPU (a single worker if that
    /// cannot be determined) named `strand-worker-{index}`.
    pub fn new() -> Self {
        Self {
            worker_threads: thread::available_parallelism().map_or(1, NonZeroUsize::get),
            thread_name: String::from("strand-worker"),
        }
    }

    /// Fixes the pool at `n` workers.
    ///
    /// # Panics
    ///
    /// Panics if `n == 0`.
    pub fn worker_threads(mut self, n: usize) -> Self {
        assert!(n > 0, "worker_threads must be > 0");

        self.worker_threads = n;
        self
    }

    /// Names workers `{prefix}-{index}`, which shows up in panics, debuggers
    /// and `tracing` output.
    pub fn thread_name(mut self, prefix: impl Into<String>) -> Self {
        self.thread_name = prefix.into();
        self
    }

    /// Spawns the workers.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ThreadSpawn`](crate::Error::ThreadSpawn) if a worker
    /// thread cannot be started.
    pub fn build(self) -> Result<ThreadPool> {
        ThreadPool::new(self.worker_threads, &self.thread_name)
    }
}

impl Default for ThreadPoolBuilder {
    fn default() -> Self {
        Self::new()
    }
}
