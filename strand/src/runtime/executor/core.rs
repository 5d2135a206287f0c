use crate::error::{BoxError, Error, Result};
use crate::runtime::context::WorkerId;
use crate::runtime::executor::job::{Produce, Resume, Work};
use crate::runtime::executor::worker::Worker;
use crate::runtime::queue::injector::{Injector, Job};
use crate::runtime::task::source::Continuation;
use crate::runtime::task::{CompletionSource, Task};
use crate::utils::lock;

use std::fmt;
use std::mem;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

/// Source of unique pool identifiers.
static NEXT_POOL_ID: AtomicUsize = AtomicUsize::new(0);

/// State shared by every handle to one pool.
struct Shared {
    /// Unique identifier of the pool.
    id: usize,

    /// Queue shared by all workers.
    injector: Arc<Injector>,

    /// Join handles of the worker threads, taken by the first shutdown.
    handles: Mutex<Vec<JoinHandle<()>>>,

    /// Number of worker threads the pool was started with.
    workers: usize,
}

/// Handle used to submit work to a thread pool.
///
/// An `Executor` is cheap to clone and every clone refers to the same pool.
/// Every operation that produces a [`Task`] takes an executor explicitly;
/// there is no implicit global pool.
///
/// The pool itself is owned by a [`ThreadPool`](crate::ThreadPool), which
/// shuts it down when dropped.
#[derive(Clone)]
pub struct Executor {
    shared: Arc<Shared>,
}

impl Executor {
    /// Starts `threads` workers named `{name}-{index}`.
    ///
    /// If a thread cannot be spawned, the workers started so far are stopped
    /// and joined before the error is returned.
    pub(crate) fn start(threads: usize, name: &str) -> Result<Self> {
        let id = NEXT_POOL_ID.fetch_add(1, Ordering::Relaxed);
        let injector = Arc::new(Injector::new());
        let mut handles = Vec::with_capacity(threads);

        for index in 0..threads {
            let worker = Worker::new(WorkerId { pool: id, index }, injector.clone());

            let spawned = thread::Builder::new()
                .name(format!("{name}-{index}"))
                .spawn(move || worker.run());

            match spawned {
                Ok(handle) => handles.push(handle),
                Err(error) => {
                    injector.close(false);
                    for handle in handles {
                        let _ = handle.join();
                    }
                    return Err(Error::ThreadSpawn(Arc::new(error)));
                }
            }
        }

        tracing::debug!(pool = id, workers = threads, "thread pool started");

        Ok(Self {
            shared: Arc::new(Shared {
                id,
                injector,
                handles: Mutex::new(handles),
                workers: threads,
            }),
        })
    }

    /// Submits a closure for execution on the pool.
    ///
    /// Closures submitted from the same thread start in submission order.
    /// Submitting from inside a worker is always accepted while the pool is
    /// running.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ExecutorStopped`] once shutdown has begun.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// executor.submit(|| println!("running on a worker"))?;
    /// ```
    pub fn submit<F>(&self, work: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        self.push(Box::new(Work(work)))
    }

    /// Runs `f` on the pool and returns a task resolving to its result.
    ///
    /// If the pool has stopped, the returned task has already failed with
    /// [`Error::ExecutorStopped`]. A panic in `f` fails the task with
    /// [`Error::Panicked`].
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// let square = executor.spawn(move || i * i);
    /// ```
    pub fn spawn<T, F>(&self, f: F) -> Task<T>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        let source = CompletionSource::bound(self.clone());
        let task = source.task();
        self.execute_into(source, move || Ok(f()));
        task
    }

    /// Runs a fallible `f` on the pool.
    ///
    /// An `Err` returned by `f` fails the task with [`Error::TaskFailure`]
    /// carrying the original error.
    pub fn try_spawn<T, E, F>(&self, f: F) -> Task<T>
    where
        T: Send + Sync + 'static,
        E: Into<BoxError>,
        F: FnOnce() -> Result<T, E> + Send + 'static,
    {
        let source = CompletionSource::bound(self.clone());
        let task = source.task();
        self.execute_into(source, move || f().map_err(Error::task));
        task
    }

    /// Stops the pool.
    ///
    /// New submissions are refused from now on. With `drain`, queued work
    /// still runs and this call returns once it has finished. Without it,
    /// queued work that has not started is abandoned: each abandoned task
    /// fails with [`Error::ExecutorStopped`].
    ///
    /// Worker threads are joined before returning, except the calling thread
    /// when shutdown is requested from inside the pool. A draining shutdown
    /// requested from a worker runs the remaining queue on that worker
    /// before joining the others. Only the first call joins.
    pub fn shutdown(&self, drain: bool) {
        tracing::debug!(pool = self.shared.id, drain, "shutting down thread pool");

        let abandoned = self.shared.injector.close(drain);
        if !abandoned.is_empty() {
            tracing::warn!(
                pool = self.shared.id,
                abandoned = abandoned.len(),
                "abandoning queued work"
            );
        }

        for job in abandoned {
            job.abandon();
        }

        // The calling worker cannot be joined, so it drains the queue itself.
        if drain && self.is_worker_thread() {
            while let Some(job) = self.shared.injector.pop() {
                if panic::catch_unwind(AssertUnwindSafe(|| job.run())).is_err() {
                    tracing::warn!(pool = self.shared.id, "work item panicked during shutdown");
                }
            }
        }

        let handles = mem::take(&mut *lock(&self.shared.handles));
        let current = thread::current().id();

        for handle in handles {
            if handle.thread().id() == current {
                continue;
            }
            let _ = handle.join();
        }
    }

    /// Returns `true` once shutdown has begun.
    pub fn is_shutdown(&self) -> bool {
        self.shared.injector.is_closed()
    }

    /// Number of worker threads in the pool.
    pub fn worker_threads(&self) -> usize {
        self.shared.workers
    }

    /// Number of submitted items that no worker has picked up yet.
    pub fn queued(&self) -> usize {
        self.shared.injector.len()
    }

    /// Returns `true` if the current thread is one of this pool's workers.
    pub fn is_worker_thread(&self) -> bool {
        crate::runtime::context::current_worker().is_some_and(|id| id.pool == self.shared.id)
    }

    /// Queues a computation whose outcome settles `source`.
    ///
    /// A refused computation fails `source` with [`Error::ExecutorStopped`].
    pub(crate) fn execute_into<T, F>(&self, source: CompletionSource<T>, work: F)
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> Result<T> + Send + 'static,
    {
        let _ = self.push(Box::new(Produce { source, work }));
    }

    /// Hands a continuation to the pool.
    ///
    /// A refused continuation runs inline on the calling thread.
    pub(crate) fn dispatch(&self, continuation: Continuation) {
        let _ = self.push(Box::new(Resume(continuation)));
    }

    fn push(&self, job: Job) -> Result<()> {
        match self.shared.injector.push(job) {
            Ok(()) => Ok(()),
            Err(job) => {
                job.abandon();
                Err(Error::ExecutorStopped)
            }
        }
    }
}

impl fmt::Debug for Executor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Executor")
            .field("pool", &self.shared.id)
            .field("workers", &self.shared.workers)
            .field("shutdown", &self.is_shutdown())
            .finish()
    }
}
