use crate::runtime::context::{WorkerId, enter_worker};
use crate::runtime::queue::injector::Injector;

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// A worker thread in the executor.
///
/// Workers share one injector and take jobs from it in FIFO order. A worker
/// runs a single job at a time, so no job ever runs concurrently with
/// itself.
pub(crate) struct Worker {
    /// Identity of the worker, installed as thread context while it runs.
    id: WorkerId,

    /// Handle to the shared injector queue.
    injector: Arc<Injector>,
}

impl Worker {
    /// Creates a new worker.
    ///
    /// # Arguments
    ///
    /// * `id` - Worker identity
    /// * `injector` - Queue shared by every worker of the pool
    pub(crate) fn new(id: WorkerId, injector: Arc<Injector>) -> Self {
        Self { id, injector }
    }

    /// Runs the worker loop.
    ///
    /// The worker takes jobs until the injector is closed and empty. A job
    /// that panics is logged and discarded; the worker keeps going.
    pub(crate) fn run(self) {
        enter_worker(self.id, || {
            tracing::debug!(worker = self.id.index, "worker started");

            while let Some(job) = self.injector.pop() {
                if panic::catch_unwind(AssertUnwindSafe(|| job.run())).is_err() {
                    tracing::warn!(worker = self.id.index, "work item panicked");
                }
            }

            tracing::debug!(worker = self.id.index, "worker stopped");
        })
    }
}
