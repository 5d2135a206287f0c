//! Retry utilities for task-producing operations.
//!
//! The main entry point is [`retry`], which relaunches an operation
//! produced by a factory closure until it succeeds or the retry limit is
//! reached, optionally pausing between attempts.

mod retry;

#[doc(inline)]
pub use retry::{Retry, retry};
