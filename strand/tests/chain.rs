use strand::task::{CompletionSource, Task};
use strand::{Error, ThreadPoolBuilder};
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[strand::test(worker_threads = 2)]
fn then_runs_on_the_executor() {
    let observer = executor.clone();

    let task = executor
        .spawn(|| 20)
        .then(&executor, move |n| (n + 1, observer.is_worker_thread()));

    assert_eq!(task.wait().unwrap(), (21, true));
}

#[strand::test]
fn then_on_failed_task_never_calls_f() {
    let called = Arc::new(AtomicBool::new(false));
    let flag = called.clone();

    let failed = Task::<i32>::failed(Error::task(io::Error::other("boom")));
    let next = failed.then(&executor, move |n| {
        flag.store(true, Ordering::SeqCst);
        n * 2
    });

    let error = next.wait().unwrap_err();

    assert!(!called.load(Ordering::SeqCst));
    assert_eq!(error.downcast_ref::<io::Error>().unwrap().to_string(), "boom");
}

#[strand::test]
fn failure_is_carried_through_a_chain() {
    let task = executor
        .try_spawn(|| Err::<i32, _>(io::Error::new(io::ErrorKind::NotFound, "missing")))
        .then(&executor, |n| n + 1)
        .then(&executor, |n| n.to_string());

    let error = task.wait().unwrap_err();

    assert!(matches!(error, Error::TaskFailure(_)));
    assert_eq!(
        error.downcast_ref::<io::Error>().map(io::Error::kind),
        Some(io::ErrorKind::NotFound)
    );
}

#[strand::test]
fn try_then_error_becomes_task_failure() {
    let task = executor
        .spawn(|| "not a number")
        .try_then(&executor, |text| text.parse::<i32>());

    let error = task.wait().unwrap_err();

    assert!(error.downcast_ref::<std::num::ParseIntError>().is_some());
}

#[strand::test]
fn panic_in_continuation_becomes_panicked() {
    let task = executor
        .spawn(|| 1)
        .then(&executor, |_| -> i32 { panic!("kaboom") });

    match task.wait() {
        Err(Error::Panicked(message)) => assert_eq!(message, "kaboom"),
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[strand::test]
fn and_then_follows_the_inner_task() {
    let inner = executor.clone();

    let task = executor
        .spawn(|| 6)
        .and_then(&executor, move |n| inner.spawn(move || n * 7));

    assert_eq!(task.wait().unwrap(), 42);
}

#[strand::test]
fn and_then_carries_inner_failure() {
    let task = executor
        .spawn(|| ())
        .and_then(&executor, |()| Task::<u8>::failed(Error::NotReady));

    assert!(matches!(task.wait(), Err(Error::NotReady)));
}

#[test]
fn map_runs_inline_on_the_resolving_thread() {
    let source = CompletionSource::new();
    let mapped = source.task().map(|n: i32| n * 3);

    assert!(!mapped.is_ready());
    source.complete(5).unwrap();

    assert_eq!(mapped.result().unwrap().unwrap(), 15);
}

#[test]
fn second_chain_on_pending_task_fails() {
    let pool = ThreadPoolBuilder::new().worker_threads(1).build().unwrap();
    let source = CompletionSource::<i32>::new();
    let task = source.task();

    let first = task.then(&pool, |n| n + 1);
    let second = task.then(&pool, |n| n + 2);

    assert!(matches!(second.result(), Some(Err(Error::AlreadyHasWaiter))));

    source.complete(1).unwrap();
    assert_eq!(first.wait().unwrap(), 2);
}

#[strand::test]
fn chain_on_completed_task_runs_right_away() {
    let task = Task::ready(10).then(&executor, |n| n + 5);

    assert_eq!(task.wait().unwrap(), 15);
}

#[strand::test]
fn chain_on_stopped_executor_fails() {
    let pool = ThreadPoolBuilder::new().worker_threads(1).build().unwrap();
    pool.shutdown(true);

    let task = executor.spawn(|| 1).then(&pool, |n| n + 1);

    assert!(matches!(task.wait(), Err(Error::ExecutorStopped)));
}

#[test]
fn flatten_mirrors_the_inner_task() {
    let outer = CompletionSource::new();
    let inner = CompletionSource::new();

    let flat = outer.task().flatten();
    outer.complete(inner.task()).unwrap();
    assert!(!flat.is_ready());

    inner.complete('x').unwrap();
    assert_eq!(flat.result().unwrap().unwrap(), 'x');
}

#[test]
fn programming_errors_are_classified() {
    assert!(Error::AlreadyCompleted.is_programming_error());
    assert!(Error::AlreadyHasWaiter.is_programming_error());
    assert!(!Error::ExecutorStopped.is_programming_error());
    assert!(!Error::task(io::Error::other("x")).is_programming_error());
}

#[test]
fn task_error_unwraps_strand_errors() {
    let error = Error::task(Error::ExecutorStopped);

    assert!(matches!(error, Error::ExecutorStopped));
}
