//! Core runtime components.
//!
//! This module contains the thread pool, its executor handle and the task
//! primitives built on top of them.
//!
//! It is responsible for:
//! - running submitted work on a fixed set of worker threads,
//! - single-assignment completion sources and the tasks reading them,
//! - chaining continuations and joining many tasks into one.

mod core;
mod executor;
mod queue;

pub(crate) mod builder;
pub(crate) mod context;

pub mod task;

pub use self::core::ThreadPool;
pub use executor::core::Executor;
