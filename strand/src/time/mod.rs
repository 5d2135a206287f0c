//! Timers.
//!
//! This module provides the timer thread and the awaitable built on it:
//! - [`TimerService`] runs callbacks when their deadlines pass,
//! - [`Sleep`] is an [`Awaitable`](crate::awaitable::Awaitable) ready once
//!   a deadline is reached,
//! - [`sleep`] and [`sleep_on`] turn a duration into a
//!   [`Task`](crate::task::Task).

mod service;
mod sleep;
mod timer;

pub use service::{TimerService, TimerServiceBuilder};
pub use sleep::{Sleep, sleep, sleep_on};
pub use timer::TimerHandle;
