use strand::Error;
use strand::task::Task;
use strand::time::TimerService;
use strand::tools::retry;
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

#[strand::test]
fn retry_succeeds_before_limit() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let counter = attempts.clone();
    let spawner = executor.clone();

    let result = retry(&executor, 5, move || {
        let counter = counter.clone();
        spawner.try_spawn(move || {
            if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(io::Error::other("fail"))
            } else {
                Ok(42)
            }
        })
    })
    .run()
    .wait();

    assert!(matches!(result, Ok(42)), "Retry should succeed before limit");
    assert_eq!(attempts.load(Ordering::SeqCst), 3);
}

#[strand::test]
fn retry_fails_after_limit() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let counter = attempts.clone();
    let spawner = executor.clone();

    let result = retry(&executor, 3, move || {
        let counter = counter.clone();
        spawner.try_spawn(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Err::<i32, _>(io::Error::other("always"))
        })
    })
    .run()
    .wait();

    let error = result.unwrap_err();
    assert_eq!(error.to_string(), "always");
    assert_eq!(attempts.load(Ordering::SeqCst), 4, "First attempt plus 3 retries");
}

#[strand::test]
fn programming_errors_are_not_retried() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let counter = attempts.clone();

    let result = retry(&executor, 5, move || {
        counter.fetch_add(1, Ordering::SeqCst);
        Task::<i32>::failed(Error::AlreadyCompleted)
    })
    .run()
    .wait();

    assert!(matches!(result, Err(Error::AlreadyCompleted)));
    assert_eq!(attempts.load(Ordering::SeqCst), 1);
}

#[strand::test]
fn retry_waits_between_attempts() {
    let timers = TimerService::new().unwrap();
    let attempts = Arc::new(AtomicUsize::new(0));
    let counter = attempts.clone();
    let start = Instant::now();

    let result = retry(&executor, 2, move || {
        if counter.fetch_add(1, Ordering::SeqCst) < 2 {
            Task::failed(Error::task("not yet"))
        } else {
            Task::ready("done")
        }
    })
    .set_interval(&timers, Duration::from_millis(50))
    .run()
    .wait();

    assert_eq!(result.unwrap(), "done");
    assert!(start.elapsed() >= Duration::from_millis(100));
    assert_eq!(timers.created(), 2);
}

#[strand::test]
fn panicking_factory_fails_the_retry() {
    let result = retry(&executor, 0, || -> Task<u8> { panic!("factory broke") })
        .run()
        .wait();

    assert!(matches!(result, Err(Error::Panicked(_))));
}
