use crate::error::{Error, Result};
use crate::utils::lock;

use std::cmp::Ordering;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{self, AtomicUsize};
use std::sync::{Arc, Mutex};
use std::time::Instant;

/// Callback run when a timer fires, or with an error when the service stops
/// before it could.
pub(crate) type TimerCallback = Box<dyn FnOnce(Result<()>) + Send + 'static>;

/// The callback of one armed timer, shared by its queue entry and its
/// [`TimerHandle`].
///
/// Whoever takes the callback first decides the timer's fate: the timer
/// thread runs it, a disarm drops it on the spot.
pub(crate) struct TimerSlot {
    callback: Mutex<Option<TimerCallback>>,

    /// Count of armed timers in the owning service.
    pending: Arc<AtomicUsize>,
}

impl TimerSlot {
    pub(crate) fn new(callback: TimerCallback, pending: Arc<AtomicUsize>) -> Self {
        Self {
            callback: Mutex::new(Some(callback)),
            pending,
        }
    }

    /// Takes the callback, releasing the timer's pending slot.
    fn take(&self) -> Option<TimerCallback> {
        let callback = lock(&self.callback).take();

        if callback.is_some() {
            self.pending.fetch_sub(1, atomic::Ordering::AcqRel);
        }

        callback
    }

    fn is_armed(&self) -> bool {
        lock(&self.callback).is_some()
    }
}

/// An entry in the timer queue.
///
/// `TimerEntry` is stored in a binary heap ordered by deadline. Entries with
/// the same deadline fire in the order they were armed.
pub(crate) struct TimerEntry {
    /// The time at which the timer should fire.
    pub(crate) deadline: Instant,

    /// Arming order, breaking ties between equal deadlines.
    pub(crate) sequence: u64,

    pub(crate) slot: Arc<TimerSlot>,
}

impl TimerEntry {
    /// Runs the callback for an expired timer.
    pub(crate) fn fire(self) {
        self.run(Ok(()));
    }

    /// Discards the entry without running its callback.
    pub(crate) fn cancel(self) {
        drop(self.slot.take());
    }

    /// Returns `false` once the timer fired or was disarmed.
    pub(crate) fn is_armed(&self) -> bool {
        self.slot.is_armed()
    }

    /// Runs the callback unless the timer was disarmed.
    ///
    /// The callback runs at most once. A panicking callback is logged and
    /// does not take the timer thread down.
    fn run(&self, outcome: Result<()>) {
        let Some(callback) = self.slot.take() else {
            return;
        };

        if panic::catch_unwind(AssertUnwindSafe(move || callback(outcome))).is_err() {
            tracing::warn!("timer callback panicked");
        }
    }
}

impl Drop for TimerEntry {
    /// An entry dropped before expiry belongs to a stopped service: its
    /// callback learns about it instead of never running.
    fn drop(&mut self) {
        self.run(Err(Error::ExecutorStopped));
    }
}

impl Eq for TimerEntry {}

impl PartialEq for TimerEntry {
    fn eq(&self, other: &Self) -> bool {
        self.deadline == other.deadline && self.sequence == other.sequence
    }
}

impl Ord for TimerEntry {
    /// Orders timer entries by deadline, then arming order.
    ///
    /// Note that the comparison is **reversed** so that a
    /// `BinaryHeap<TimerEntry>` behaves as a min-heap,
    /// where the earliest deadline is popped first.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .deadline
            .cmp(&self.deadline)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

impl PartialOrd for TimerEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Handle to an armed timer.
///
/// Dropping the handle does **not** disarm the timer.
#[derive(Clone)]
pub struct TimerHandle {
    slot: Arc<TimerSlot>,
}

impl TimerHandle {
    pub(crate) fn new(slot: Arc<TimerSlot>) -> Self {
        Self { slot }
    }

    /// Disarms the timer.
    ///
    /// Returns `true` if the timer was still armed, in which case its
    /// callback is dropped right away and will never run. Returns `false`
    /// if it already fired or was disarmed.
    pub fn disarm(&self) -> bool {
        self.slot.take().is_some()
    }

    /// Returns `true` once the timer fired or was disarmed.
    pub fn is_done(&self) -> bool {
        !self.slot.is_armed()
    }
}

impl fmt::Debug for TimerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerHandle")
            .field("done", &self.is_done())
            .finish()
    }
}
