//! Task primitives.
//!
//! This module defines the building blocks used to represent deferred
//! results and compose them:
//! - [`CompletionSource`], the single-assignment write side,
//! - [`Task`], the read side, with continuation chaining,
//! - [`JoinSet`] and [`join_all`], the fan-in barrier.
//!
//! Tasks are usually created through [`Executor::spawn`](crate::Executor::spawn)
//! or [`suspend`](crate::awaitable::suspend) rather than from a source
//! directly.

mod chain;
mod set;

pub(crate) mod core;
pub(crate) mod source;

pub use self::core::Task;
pub use set::{JoinPolicy, JoinSet, join_all, join_all_with, join_unit};
pub use source::CompletionSource;
