//! # Strand
//!
//! **Strand** is a small toolkit for writing fan-out/fan-in work on a thread
//! pool as chains of continuations.
//!
//! A computation that has to wait, for a timer or for another computation,
//! is expressed as a [`Task`](task::Task): the read side of a single
//! assignment slot. Tasks are chained with `then`, `and_then` and `map`,
//! joined with [`join_all`](task::join_all), and bridged from any
//! readiness-based operation with [`suspend`](awaitable::suspend). No
//! thread blocks while a task is pending.
//!
//! Strand provides:
//!
//! - A **thread pool** with FIFO submission and draining or aborting shutdown
//! - **Completion sources** with exactly-once continuation firing
//! - A **timer service** and the [`Sleep`](time::Sleep) awaitable
//! - **Join barriers** with fail-fast or wait-all failure policies
//! - **Ergonomic macros** like `#[strand::main]`, `#[strand::test]` and `join!`
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use strand::task::join_all;
//! use strand::time::{TimerService, sleep};
//! use std::time::Duration;
//!
//! #[strand::main(worker_threads = 4)]
//! fn main() -> strand::Result<()> {
//!     let timers = TimerService::new()?;
//!
//!     let tasks = (0..10u64).map(|i| {
//!         sleep(&timers, Duration::from_millis(10 * i))
//!             .then(&executor, move |()| i * i)
//!     });
//!
//!     println!("{:?}", join_all(tasks).wait()?);
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`task`]: Tasks, completion sources and joins
//! - [`awaitable`]: The readiness bridge and its adapters
//! - [`time`]: Timer service and sleep
//! - [`tools`]: Utilities like retry mechanisms
//! - [`sequence`]: Lazy sequences
//!
//! ## Getting Started
//!
//! Add Strand to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! strand = { git = "https://github.com/Nebula-ecosystem/Strand", package = "strand" }
//! ```

mod error;
mod runtime;
mod utils;

pub mod awaitable;
pub mod sequence;
pub mod time;
pub mod tools;

pub use error::{BoxError, Error, Result};
pub use runtime::builder::ThreadPoolBuilder;
pub use runtime::context::{WorkerId, current_worker};
pub use runtime::{Executor, ThreadPool, task};

pub use strand_macros::*;
