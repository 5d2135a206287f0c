use crate::runtime::executor::job::Runnable;
use crate::utils::{lock, wait};

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex};

/// A queued unit of work.
pub(crate) type Job = Box<dyn Runnable>;

/// State protected by the injector lock.
struct Queue {
    /// Jobs waiting for a worker, oldest first.
    jobs: VecDeque<Job>,

    /// Number of workers blocked in [`Injector::pop`].
    parked: usize,

    /// Cleared once shutdown begins; no job is accepted afterwards.
    open: bool,
}

/// Global FIFO job queue.
///
/// Every submission goes through the injector. Workers block on its
/// condition variable while the queue is empty and are released either by a
/// new job or by [`close`](Self::close).
pub(crate) struct Injector {
    queue: Mutex<Queue>,
    condvar: Condvar,
}

impl Injector {
    /// Creates a new empty, open injector.
    pub(crate) fn new() -> Self {
        Injector {
            queue: Mutex::new(Queue {
                jobs: VecDeque::new(),
                parked: 0,
                open: true,
            }),
            condvar: Condvar::new(),
        }
    }

    /// Pushes a job to the back of the queue.
    ///
    /// The job is handed back if the injector has been closed, so the caller
    /// can abandon it.
    pub(crate) fn push(&self, job: Job) -> Result<(), Job> {
        let mut queue = lock(&self.queue);

        if !queue.open {
            return Err(job);
        }

        queue.jobs.push_back(job);

        if queue.parked > 0 {
            self.condvar.notify_one();
        }

        Ok(())
    }

    /// Takes the oldest job, blocking while the queue is empty.
    ///
    /// Returns `None` once the injector is closed and no job is left, which
    /// tells the calling worker to exit.
    pub(crate) fn pop(&self) -> Option<Job> {
        let mut queue = lock(&self.queue);

        loop {
            if let Some(job) = queue.jobs.pop_front() {
                return Some(job);
            }

            if !queue.open {
                return None;
            }

            queue.parked += 1;
            queue = wait(&self.condvar, queue);
            queue.parked -= 1;
        }
    }

    /// Closes the injector and wakes every parked worker.
    ///
    /// With `drain`, queued jobs stay in place and workers run them before
    /// exiting. Otherwise they are removed and returned so the caller can
    /// abandon them.
    pub(crate) fn close(&self, drain: bool) -> Vec<Job> {
        let mut queue = lock(&self.queue);
        queue.open = false;

        let abandoned = if drain {
            Vec::new()
        } else {
            queue.jobs.drain(..).collect()
        };

        self.condvar.notify_all();
        abandoned
    }

    /// Returns `true` once [`close`](Self::close) has been called.
    pub(crate) fn is_closed(&self) -> bool {
        !lock(&self.queue).open
    }

    /// Number of jobs waiting for a worker.
    pub(crate) fn len(&self) -> usize {
        lock(&self.queue).jobs.len()
    }
}
