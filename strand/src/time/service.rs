use super::Sleep;
use super::timer::{TimerEntry, TimerHandle, TimerSlot};
use crate::error::{Error, Result};
use crate::utils::lock;

use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::mpsc::{Receiver, RecvTimeoutError, SendError, Sender, channel};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Messages sent to the timer thread.
enum Command {
    Arm(TimerEntry),
    Shutdown,
}

/// State shared by every handle to one timer service.
struct Inner {
    /// Sender side of the command channel.
    sender: Sender<Command>,

    /// Number of timers ever armed.
    created: AtomicUsize,

    /// Number of timers currently armed.
    pending: Arc<AtomicUsize>,

    /// Arming order of the next timer.
    sequence: AtomicU64,

    /// Upper bound on `pending`.
    max_pending: usize,

    /// Timer thread, taken by the first shutdown.
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl Inner {
    fn shutdown(&self) {
        let _ = self.sender.send(Command::Shutdown);

        let Some(handle) = lock(&self.thread).take() else {
            return;
        };

        // The last handle may be released by a callback on the timer thread.
        if handle.thread().id() != thread::current().id() {
            let _ = handle.join();
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// A timer thread that runs callbacks when their deadlines pass.
///
/// The service runs on a dedicated thread and keeps armed timers in a
/// min-heap ordered by deadline. Callbacks run on that thread, so they
/// must be short: anything substantial should be handed to an
/// [`Executor`](crate::Executor).
///
/// `TimerService` is cheap to clone; the thread stops when the last clone
/// is dropped or [`shutdown`](Self::shutdown) is called. Timers still armed
/// at that point have their callbacks run with [`Error::ExecutorStopped`].
#[derive(Clone)]
pub struct TimerService {
    inner: Arc<Inner>,
}

impl TimerService {
    /// Starts a timer service with the default configuration.
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    /// Returns a builder for configuring the service.
    pub fn builder() -> TimerServiceBuilder {
        TimerServiceBuilder::new()
    }

    /// Arms a timer that runs `callback` once `duration` has elapsed.
    ///
    /// The callback receives `Ok(())` on expiry, or
    /// [`Error::ExecutorStopped`] if the service stops first. It never runs
    /// if the timer is disarmed in time.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TimerCreationFailed`] if the configured limit of
    /// armed timers is reached, if the deadline is not representable, or if
    /// the timer thread is no longer running. `callback` is dropped without
    /// running in that case.
    pub fn arm<F>(&self, duration: Duration, callback: F) -> Result<TimerHandle>
    where
        F: FnOnce(Result<()>) + Send + 'static,
    {
        let inner = &self.inner;

        let Some(deadline) = Instant::now().checked_add(duration) else {
            return Err(Error::TimerCreationFailed(format!(
                "deadline {duration:?} from now is out of range"
            )));
        };

        let reserved = inner
            .pending
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                (n < inner.max_pending).then_some(n + 1)
            });

        if reserved.is_err() {
            return Err(Error::TimerCreationFailed(format!(
                "{} timers already armed",
                inner.max_pending
            )));
        }

        let slot = Arc::new(TimerSlot::new(Box::new(callback), inner.pending.clone()));

        let entry = TimerEntry {
            deadline,
            sequence: inner.sequence.fetch_add(1, Ordering::Relaxed),
            slot: slot.clone(),
        };

        if let Err(SendError(command)) = inner.sender.send(Command::Arm(entry)) {
            if let Command::Arm(entry) = command {
                entry.cancel();
            }
            return Err(Error::TimerCreationFailed(String::from(
                "timer thread is not running",
            )));
        }

        inner.created.fetch_add(1, Ordering::Relaxed);

        Ok(TimerHandle::new(slot))
    }

    /// Disarms a timer. See [`TimerHandle::disarm`].
    pub fn disarm(&self, handle: &TimerHandle) -> bool {
        handle.disarm()
    }

    /// Returns a timer awaitable completing after `duration`.
    pub fn sleep(&self, duration: Duration) -> Sleep {
        Sleep::new(self, duration)
    }

    /// Returns a timer awaitable completing at `deadline`.
    pub fn sleep_until(&self, deadline: Instant) -> Sleep {
        Sleep::until(self, deadline)
    }

    /// Number of timers armed since the service started.
    pub fn created(&self) -> usize {
        self.inner.created.load(Ordering::Relaxed)
    }

    /// Number of timers currently armed.
    pub fn pending(&self) -> usize {
        self.inner.pending.load(Ordering::Acquire)
    }

    /// Stops the timer thread.
    ///
    /// Armed timers have their callbacks run with
    /// [`Error::ExecutorStopped`]; later calls to [`arm`](Self::arm) fail.
    pub fn shutdown(&self) {
        self.inner.shutdown();
    }
}

/// Builder for a [`TimerService`].
pub struct TimerServiceBuilder {
    /// Maximum number of simultaneously armed timers.
    max_pending: usize,

    /// Name of the timer thread.
    thread_name: String,
}

impl TimerServiceBuilder {
    /// Creates a builder with default configuration.
    ///
    /// By default the number of armed timers is unbounded.
    pub fn new() -> Self {
        Self {
            max_pending: usize::MAX,
            thread_name: String::from("strand-timer"),
        }
    }

    /// Limits the number of simultaneously armed timers.
    ///
    /// Arming beyond the limit fails with
    /// [`Error::TimerCreationFailed`].
    pub fn max_pending(mut self, n: usize) -> Self {
        self.max_pending = n;
        self
    }

    /// Sets the name of the timer thread.
    pub fn thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    /// Starts the timer thread.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ThreadSpawn`] if the thread cannot be started.
    pub fn build(self) -> Result<TimerService> {
        let (sender, receiver) = channel();
        let pending = Arc::new(AtomicUsize::new(0));
        let armed = pending.clone();

        let handle = thread::Builder::new()
            .name(self.thread_name)
            .spawn(move || run(receiver, &armed))
            .map_err(|error| Error::ThreadSpawn(Arc::new(error)))?;

        Ok(TimerService {
            inner: Arc::new(Inner {
                sender,
                created: AtomicUsize::new(0),
                pending,
                sequence: AtomicU64::new(0),
                max_pending: self.max_pending,
                thread: Mutex::new(Some(handle)),
            }),
        })
    }
}

impl Default for TimerServiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Heap size below which disarmed entries are left to expire.
const COMPACT_THRESHOLD: usize = 64;

/// Timer thread loop.
///
/// The loop performs the following steps:
/// 1. Wait for a command, at most until the earliest deadline
/// 2. Queue newly armed timers
/// 3. Fire every expired timer
/// 4. Drop disarmed entries once they outnumber the armed ones
///
/// On shutdown the remaining entries and any command still in flight are
/// dropped, which runs their callbacks with [`Error::ExecutorStopped`].
fn run(receiver: Receiver<Command>, armed: &AtomicUsize) {
    let mut timers: BinaryHeap<TimerEntry> = BinaryHeap::new();

    loop {
        let command = match timers.peek() {
            Some(next) => {
                receiver.recv_timeout(next.deadline.saturating_duration_since(Instant::now()))
            }
            None => receiver.recv().map_err(|_| RecvTimeoutError::Disconnected),
        };

        match command {
            Ok(Command::Arm(entry)) => timers.push(entry),
            Ok(Command::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {}
        }

        let now = Instant::now();
        while timers.peek().is_some_and(|next| next.deadline <= now) {
            if let Some(entry) = timers.pop() {
                tracing::trace!(sequence = entry.sequence, "timer fired");
                entry.fire();
            }
        }

        if timers.len() > COMPACT_THRESHOLD && timers.len() > 2 * armed.load(Ordering::Acquire) {
            let before = timers.len();
            timers.retain(TimerEntry::is_armed);
            tracing::trace!(removed = before - timers.len(), "dropped disarmed timers");
        }
    }

    tracing::debug!(remaining = timers.len(), "timer thread stopping");

    drop(timers);
    while let Ok(command) = receiver.try_recv() {
        drop(command);
    }
}
