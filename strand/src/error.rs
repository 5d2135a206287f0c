use std::any::Any;
use std::error::Error as StdError;
use std::io;
use std::sync::Arc;

use thiserror::Error;

/// A specialized `Result` type for runtime operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Boxed error type accepted from user computations.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Errors produced by the runtime.
///
/// A resolved task may be read any number of times, so every variant is
/// cheaply cloneable: foreign errors are kept behind an [`Arc`].
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// A completion source was completed a second time.
    #[error("completion source was already completed")]
    AlreadyCompleted,

    /// A second continuation was registered on a single-waiter source.
    #[error("completion source already has a waiting continuation")]
    AlreadyHasWaiter,

    /// A result was extracted before the awaitable became ready.
    #[error("result taken before the awaitable was ready")]
    NotReady,

    /// The timer service could not arm a new timer.
    #[error("failed to create timer: {0}")]
    TimerCreationFailed(String),

    /// Work was submitted after shutdown began, or was abandoned by it.
    #[error("executor has stopped")]
    ExecutorStopped,

    /// A runtime thread could not be spawned.
    #[error("failed to spawn runtime thread")]
    ThreadSpawn(#[source] Arc<io::Error>),

    /// A user computation failed. The inner error is passed through unchanged.
    #[error(transparent)]
    TaskFailure(Arc<dyn StdError + Send + Sync + 'static>),

    /// A user computation panicked.
    #[error("task panicked: {0}")]
    Panicked(String),

    /// One or more members of a wait-all join failed.
    ///
    /// Each entry carries the member's position in the joined sequence.
    #[error("{} joined task(s) failed", .0.len())]
    Aggregate(Vec<(usize, Error)>),
}

impl Error {
    /// Wraps the failure of a user computation.
    ///
    /// A runtime [`Error`] handed back by user code is kept as is rather than
    /// nested inside another `TaskFailure`.
    pub fn task<E>(error: E) -> Self
    where
        E: Into<BoxError>,
    {
        match error.into().downcast::<Error>() {
            Ok(error) => *error,
            Err(other) => Error::TaskFailure(Arc::from(other)),
        }
    }

    /// Returns `true` for errors that indicate a logic bug in the caller.
    ///
    /// These are never retried.
    pub fn is_programming_error(&self) -> bool {
        matches!(
            self,
            Error::AlreadyCompleted | Error::AlreadyHasWaiter | Error::NotReady
        )
    }

    /// Returns the user error carried by a `TaskFailure`, if it has type `E`.
    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: StdError + 'static,
    {
        match self {
            Error::TaskFailure(inner) => (**inner).downcast_ref::<E>(),
            _ => None,
        }
    }

    pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&'static str>() {
            (*s).to_owned()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            String::from("opaque panic payload")
        };

        Error::Panicked(message)
    }
}
