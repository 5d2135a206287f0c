use super::TimerService;
use super::timer::TimerHandle;
use crate::awaitable::{Awaitable, Resume, suspend, suspend_on};
use crate::runtime::Executor;
use crate::error::{Error, Result};
use crate::runtime::task::Task;
use crate::utils::lock;

use std::sync::{Arc, Mutex, OnceLock};
use std::time::{Duration, Instant};

/// Creates a task that completes after the given duration.
///
/// The timer is armed on `timers`. A zero duration completes the task right
/// away without arming anything.
///
/// # Examples
///
/// ```rust,ignore
/// use std::time::Duration;
///
/// sleep(&timers, Duration::from_millis(10))
///     .then(&executor, |()| println!("10ms later"));
/// ```
pub fn sleep(timers: &TimerService, duration: Duration) -> Task<()> {
    suspend(Sleep::new(timers, duration))
}

/// Creates a task that completes after the given duration, with its
/// continuation run on `executor` rather than on the timer thread.
///
/// # Examples
///
/// ```rust,ignore
/// sleep_on(&timers, &executor, Duration::from_millis(10))
///     .map(|()| expensive_step());
/// ```
pub fn sleep_on(timers: &TimerService, executor: &Executor, duration: Duration) -> Task<()> {
    suspend_on(executor, Sleep::new(timers, duration))
}

/// Registration state of a [`Sleep`].
enum Registration {
    /// Nothing registered yet.
    Idle,

    /// A timer is armed and will resume the waiter.
    Armed(TimerHandle),

    /// The waiter has been resumed without a timer.
    Resumed,
}

/// An awaitable that becomes ready once a deadline is reached.
///
/// `Sleep` arms a timer on its [`TimerService`] only when a resumption is
/// registered and the deadline is still ahead. The timer is disarmed if the
/// sleep is dropped before it fires.
pub struct Sleep {
    /// Absolute point in time when the sleep completes.
    deadline: Instant,

    /// Service the timer is armed on.
    timers: TimerService,

    registration: Mutex<Registration>,

    /// Outcome delivered by the timer thread.
    fired: Arc<OnceLock<Result<()>>>,
}

impl Sleep {
    /// Creates a sleep completing after `duration`.
    pub fn new(timers: &TimerService, duration: Duration) -> Self {
        let now = Instant::now();
        let deadline = now.checked_add(duration).unwrap_or_else(|| far_future(now));
        Self::until(timers, deadline)
    }

    /// Creates a sleep completing at `deadline`.
    ///
    /// A deadline in the past makes the sleep ready immediately.
    pub fn until(timers: &TimerService, deadline: Instant) -> Self {
        Self {
            deadline,
            timers: timers.clone(),
            registration: Mutex::new(Registration::Idle),
            fired: Arc::new(OnceLock::new()),
        }
    }

    /// Returns the instant at which the sleep completes.
    pub fn deadline(&self) -> Instant {
        self.deadline
    }
}

impl Awaitable for Sleep {
    type Output = ();

    fn is_ready(&self) -> bool {
        self.fired.get().is_some() || Instant::now() >= self.deadline
    }

    fn on_ready(&self, resume: Resume) -> Result<()> {
        let mut registration = lock(&self.registration);

        if !matches!(*registration, Registration::Idle) {
            return Err(Error::AlreadyHasWaiter);
        }

        let remaining = self.deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            *registration = Registration::Resumed;
            drop(registration);
            resume();
            return Ok(());
        }

        let fired = self.fired.clone();
        let handle = self.timers.arm(remaining, move |outcome| {
            let _ = fired.set(outcome);
            resume();
        })?;

        *registration = Registration::Armed(handle);
        Ok(())
    }

    fn take_result(&self) -> Result<()> {
        if let Some(outcome) = self.fired.get() {
            return outcome.clone();
        }

        if Instant::now() >= self.deadline {
            Ok(())
        } else {
            Err(Error::NotReady)
        }
    }
}

impl Drop for Sleep {
    fn drop(&mut self) {
        if let Registration::Armed(handle) = &*lock(&self.registration) {
            if handle.disarm() {
                tracing::trace!("sleep dropped before its timer fired");
            }
        }
    }
}

/// A deadline far enough ahead to never be reached, roughly 30 years.
fn far_future(now: Instant) -> Instant {
    const FAR: Duration = Duration::from_secs(86400 * 365 * 30);
    now.checked_add(FAR).unwrap_or(now)
}
