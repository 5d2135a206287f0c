use crate::error::{Error, Result};
use crate::runtime::task::CompletionSource;
use crate::runtime::task::source::Continuation;

use std::panic::{self, AssertUnwindSafe};

/// A unit of work that can be executed by a worker.
///
/// Every job also knows how to give up: when shutdown discards a job
/// before it starts, [`abandon`](Self::abandon) makes sure nobody waiting on
/// it is left hanging.
pub(crate) trait Runnable: Send {
    /// Executes the job on the current worker.
    fn run(self: Box<Self>);

    /// Disposes of a job that will never run.
    fn abandon(self: Box<Self>);
}

/// Plain work submitted through [`Executor::submit`](crate::Executor::submit).
///
/// Nothing observes it, so abandoning it only drops the closure.
pub(crate) struct Work<F>(pub(crate) F);

impl<F> Runnable for Work<F>
where
    F: FnOnce() + Send + 'static,
{
    fn run(self: Box<Self>) {
        (self.0)()
    }

    fn abandon(self: Box<Self>) {}
}

/// A computation whose outcome settles a completion source.
pub(crate) struct Produce<T, F> {
    pub(crate) source: CompletionSource<T>,
    pub(crate) work: F,
}

impl<T, F> Runnable for Produce<T, F>
where
    T: Send + Sync + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    fn run(self: Box<Self>) {
        let Produce { source, work } = *self;

        let outcome = match panic::catch_unwind(AssertUnwindSafe(work)) {
            Ok(outcome) => outcome,
            Err(payload) => Err(Error::from_panic(payload)),
        };

        let _ = source.settle(outcome);
    }

    fn abandon(self: Box<Self>) {
        let _ = self.source.fail(Error::ExecutorStopped);
    }
}

/// A continuation handed to the executor by its producer.
///
/// Continuations forward outcomes between sources, so an abandoned one still
/// runs, inline, on the thread that discards it.
pub(crate) struct Resume(pub(crate) Continuation);

impl Runnable for Resume {
    fn run(self: Box<Self>) {
        (self.0)()
    }

    fn abandon(self: Box<Self>) {
        tracing::warn!("executor stopped, running continuation inline");
        (self.0)()
    }
}
