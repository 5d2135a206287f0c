//! Task executor implementation.
//!
//! This module contains the components responsible for running work on the
//! pool's threads:
//! - [`core`]: the cloneable [`Executor`](core::Executor) handle and shutdown,
//! - [`worker`]: worker threads draining the shared queue,
//! - [`job`]: the kinds of work items and how each one is abandoned.

pub(crate) mod core;
pub(crate) mod job;
pub(crate) mod worker;
