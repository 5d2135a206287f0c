use std::cell::Cell;

/// Identifies a worker thread within a particular pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WorkerId {
    /// Pool the worker belongs to.
    pub(crate) pool: usize,

    /// Index of the worker within its pool.
    pub(crate) index: usize,
}

impl WorkerId {
    /// Index of the worker within its pool, starting at zero.
    pub fn index(&self) -> usize {
        self.index
    }
}

thread_local! {
    /// Worker identity of the current thread, if it is a pool worker.
    static CURRENT_WORKER: Cell<Option<WorkerId>> = const { Cell::new(None) };
}

/// Runs `f` with the current thread registered as worker `id`.
///
/// The previous registration is restored afterwards.
pub(crate) fn enter_worker<R>(id: WorkerId, f: impl FnOnce() -> R) -> R {
    let previous = CURRENT_WORKER.with(|cell| cell.replace(Some(id)));
    let out = f();
    CURRENT_WORKER.with(|cell| cell.set(previous));
    out
}

/// Returns the identity of the worker running the current thread.
///
/// Returns `None` outside of any thread pool. Continuations migrate between
/// threads, so the answer is only meaningful until the next suspension point.
pub fn current_worker() -> Option<WorkerId> {
    CURRENT_WORKER.with(Cell::get)
}
