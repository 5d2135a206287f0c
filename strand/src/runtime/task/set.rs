use super::{CompletionSource, Task};
use crate::error::{Error, Result};
use crate::utils::lock;

use std::mem;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// What a join does when a member fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JoinPolicy {
    /// Fail the join with the first observed failure, without waiting for
    /// the remaining members. They keep running; their outcomes are
    /// discarded.
    #[default]
    FailFast,

    /// Wait for every member. If any failed, fail the join with
    /// [`Error::Aggregate`] listing every failure in input order.
    WaitAll,
}

/// An ordered collection of tasks joined into a single task.
///
/// `JoinSet` is useful for fanning out many computations and waiting for
/// all of them:
///
/// ```rust,ignore
/// let mut set = JoinSet::new();
/// for i in 0..10 {
///     set.push(executor.spawn(move || i * i));
/// }
/// let squares = set.join().wait()?;
/// ```
///
/// Results come back in the order the tasks were pushed, whatever order
/// they complete in.
pub struct JoinSet<T> {
    /// Members, in insertion order.
    tasks: Vec<Task<T>>,

    /// Failure policy applied by [`join`](Self::join).
    policy: JoinPolicy,
}

impl<T> JoinSet<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Creates a new, empty `JoinSet` with the fail-fast policy.
    pub fn new() -> Self {
        Self {
            tasks: Vec::new(),
            policy: JoinPolicy::default(),
        }
    }

    /// Sets the failure policy.
    pub fn with_policy(mut self, policy: JoinPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Adds a task to the set.
    pub fn push(&mut self, task: Task<T>) {
        self.tasks.push(task);
    }

    /// Returns the number of tasks in the set.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Returns `true` if the set contains no tasks.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Joins every task of the set.
    ///
    /// The returned task resolves to the members' values in insertion
    /// order, or fails according to the set's [`JoinPolicy`]. An empty set
    /// resolves immediately to an empty vector.
    ///
    /// Each member's continuation slot is used by the join. A member that
    /// already has a continuation waiting counts as failed with
    /// [`Error::AlreadyHasWaiter`].
    pub fn join(self) -> Task<Vec<T>> {
        let count = self.tasks.len();
        let output = CompletionSource::new();
        let task = output.task();

        if count == 0 {
            let _ = output.complete(Vec::new());
            return task;
        }

        let barrier = Arc::new(Barrier {
            remaining: AtomicUsize::new(count),
            slots: Mutex::new((0..count).map(|_| None).collect()),
            failures: Mutex::new(Vec::new()),
            output,
            policy: self.policy,
        });

        for (index, member) in self.tasks.into_iter().enumerate() {
            let arrival = barrier.clone();

            if let Err(error) = member.on_settled(move |outcome| arrival.arrive(index, outcome)) {
                barrier.arrive(index, Err(error));
            }
        }

        task
    }

    /// Joins every task of the set, discarding the values.
    pub fn join_unit(self) -> Task<()> {
        self.join().map(|_| ())
    }
}

impl<T> Default for JoinSet<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FromIterator<Task<T>> for JoinSet<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn from_iter<I: IntoIterator<Item = Task<T>>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

impl<T> Extend<Task<T>> for JoinSet<T> {
    fn extend<I: IntoIterator<Item = Task<T>>>(&mut self, iter: I) {
        self.tasks.extend(iter);
    }
}

/// Joins `tasks` with the fail-fast policy.
///
/// The returned task resolves to every value in input order, or fails with
/// the first failure observed.
pub fn join_all<T, I>(tasks: I) -> Task<Vec<T>>
where
    T: Clone + Send + Sync + 'static,
    I: IntoIterator<Item = Task<T>>,
{
    join_all_with(JoinPolicy::FailFast, tasks)
}

/// Joins `tasks` with the given failure policy.
pub fn join_all_with<T, I>(policy: JoinPolicy, tasks: I) -> Task<Vec<T>>
where
    T: Clone + Send + Sync + 'static,
    I: IntoIterator<Item = Task<T>>,
{
    tasks
        .into_iter()
        .collect::<JoinSet<T>>()
        .with_policy(policy)
        .join()
}

/// Joins `tasks` with the fail-fast policy, discarding the values.
pub fn join_unit<T, I>(tasks: I) -> Task<()>
where
    T: Clone + Send + Sync + 'static,
    I: IntoIterator<Item = Task<T>>,
{
    tasks.into_iter().collect::<JoinSet<T>>().join_unit()
}

/// Countdown shared by the members of one join.
struct Barrier<T> {
    /// Members that have not arrived yet.
    remaining: AtomicUsize,

    /// Values by input position.
    slots: Mutex<Vec<Option<T>>>,

    /// Failures collected under [`JoinPolicy::WaitAll`].
    failures: Mutex<Vec<(usize, Error)>>,

    /// Output of the join. Completed by exactly one arrival.
    output: CompletionSource<Vec<T>>,

    policy: JoinPolicy,
}

impl<T> Barrier<T>
where
    T: Send + Sync + 'static,
{
    /// Records the outcome of member `index`.
    ///
    /// The arrival that brings the countdown to zero assembles the output,
    /// unless a fail-fast failure already resolved it.
    fn arrive(&self, index: usize, outcome: Result<T>) {
        match outcome {
            Ok(value) => lock(&self.slots)[index] = Some(value),
            Err(error) => match self.policy {
                JoinPolicy::FailFast => {
                    if self.output.fail(error).is_ok() {
                        tracing::trace!(index, "join failed fast");
                    }
                }
                JoinPolicy::WaitAll => lock(&self.failures).push((index, error)),
            },
        }

        if self.remaining.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.finish();
        }
    }

    fn finish(&self) {
        if self.output.is_completed() {
            return;
        }

        let mut failures = mem::take(&mut *lock(&self.failures));
        if !failures.is_empty() {
            failures.sort_by_key(|(index, _)| *index);
            let _ = self.output.fail(Error::Aggregate(failures));
            return;
        }

        let values: Option<Vec<T>> = mem::take(&mut *lock(&self.slots)).into_iter().collect();

        if let Some(values) = values {
            let _ = self.output.complete(values);
        }
    }
}

impl<A> Task<A>
where
    A: Clone + Send + Sync + 'static,
{
    /// Joins this task with `other` into a task of both values.
    ///
    /// Fails with whichever failure is observed first.
    pub fn zip<B>(&self, other: &Task<B>) -> Task<(A, B)>
    where
        B: Clone + Send + Sync + 'static,
    {
        let output = CompletionSource::new();
        let task = output.task();

        let pair = Arc::new(Pair {
            remaining: AtomicUsize::new(2),
            left: Mutex::new(None),
            right: Mutex::new(None),
            output,
        });

        let left = pair.clone();
        if let Err(error) = self.on_settled(move |outcome| {
            left.arrive(outcome.map(|value| *lock(&left.left) = Some(value)));
        }) {
            pair.arrive(Err(error));
        }

        let right = pair.clone();
        if let Err(error) = other.on_settled(move |outcome| {
            right.arrive(outcome.map(|value| *lock(&right.right) = Some(value)));
        }) {
            pair.arrive(Err(error));
        }

        task
    }
}

/// Countdown shared by the two sides of a [`Task::zip`].
struct Pair<A, B> {
    remaining: AtomicUsize,
    left: Mutex<Option<A>>,
    right: Mutex<Option<B>>,
    output: CompletionSource<(A, B)>,
}

impl<A, B> Pair<A, B>
where
    A: Send + Sync + 'static,
    B: Send + Sync + 'static,
{
    /// Records one side's arrival. The side stores its value before calling.
    fn arrive(&self, outcome: Result<()>) {
        if let Err(error) = outcome {
            let _ = self.output.fail(error);
        }

        if self.remaining.fetch_sub(1, Ordering::AcqRel) == 1 && !self.output.is_completed() {
            let left = lock(&self.left).take();
            let right = lock(&self.right).take();

            if let (Some(left), Some(right)) = (left, right) {
                let _ = self.output.complete((left, right));
            }
        }
    }
}
