//! Work queue shared by the executor's workers.
//!
//! A single FIFO [`injector`] feeds every worker. Items submitted from one
//! thread therefore start in submission order; there is no per-worker queue
//! that could reorder them.

pub(crate) mod injector;
