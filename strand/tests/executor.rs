use strand::task::Task;
use strand::{Error, ThreadPoolBuilder, current_worker};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, mpsc};
use std::thread;
use std::time::Duration;

#[test]
fn abort_shutdown_fails_every_queued_task() {
    let pool = ThreadPoolBuilder::new().worker_threads(1).build().unwrap();
    let (started_tx, started_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel::<()>();

    pool.submit(move || {
        started_tx.send(()).unwrap();
        let _ = release_rx.recv();
    })
    .unwrap();
    started_rx.recv().unwrap();

    let queued: Vec<Task<usize>> = (0..5).map(|i| pool.spawn(move || i)).collect();
    assert_eq!(pool.queued(), 5);

    let executor = pool.executor().clone();
    let stopper = thread::spawn(move || executor.shutdown(false));

    for task in &queued {
        let outcome = task.wait_timeout(Duration::from_secs(5)).unwrap();
        assert!(matches!(outcome, Err(Error::ExecutorStopped)));
    }

    release_tx.send(()).unwrap();
    stopper.join().unwrap();

    assert!(pool.is_shutdown());
    assert_eq!(pool.queued(), 0);
}

#[test]
fn drain_shutdown_runs_queued_work() {
    let pool = ThreadPoolBuilder::new().worker_threads(2).build().unwrap();

    let tasks: Vec<_> = (0..50).map(|i| pool.spawn(move || i * 2)).collect();
    pool.shutdown(true);

    for (i, task) in tasks.iter().enumerate() {
        assert_eq!(task.result().unwrap().unwrap(), i * 2);
    }
}

#[test]
fn submit_after_shutdown_is_refused() {
    let pool = ThreadPoolBuilder::new().worker_threads(1).build().unwrap();
    pool.shutdown(true);

    assert!(matches!(pool.submit(|| {}), Err(Error::ExecutorStopped)));
    assert!(matches!(
        pool.spawn(|| 1).result(),
        Some(Err(Error::ExecutorStopped))
    ));
}

#[test]
fn single_worker_runs_in_submission_order() {
    let pool = ThreadPoolBuilder::new().worker_threads(1).build().unwrap();
    let order = Arc::new(Mutex::new(Vec::new()));

    for i in 0..100 {
        let order = order.clone();
        pool.submit(move || order.lock().unwrap().push(i)).unwrap();
    }

    pool.shutdown(true);

    assert_eq!(*order.lock().unwrap(), (0..100).collect::<Vec<_>>());
}

#[strand::test(worker_threads = 2)]
fn submit_from_inside_a_worker() {
    let inner = executor.clone();

    let nested = executor.spawn(move || inner.spawn(|| 7)).flatten();

    assert_eq!(nested.wait().unwrap(), 7);
}

#[test]
fn panicking_work_does_not_kill_the_worker() {
    let pool = ThreadPoolBuilder::new().worker_threads(1).build().unwrap();

    pool.submit(|| panic!("lost")).unwrap();
    let failed = pool.spawn(|| -> u8 { panic!("caught") });
    let after = pool.spawn(|| "still running");

    assert!(matches!(failed.wait(), Err(Error::Panicked(_))));
    assert_eq!(after.wait().unwrap(), "still running");
}

#[test]
#[should_panic(expected = "worker_threads must be > 0")]
fn zero_worker_threads_panics() {
    let _ = ThreadPoolBuilder::new().worker_threads(0);
}

#[test]
fn workers_are_named_after_the_prefix() {
    let pool = ThreadPoolBuilder::new()
        .worker_threads(1)
        .thread_name("calc")
        .build()
        .unwrap();

    let name = pool.spawn(|| thread::current().name().map(str::to_owned));

    assert_eq!(name.wait().unwrap().as_deref(), Some("calc-0"));
    assert_eq!(pool.worker_threads(), 1);
}

#[test]
fn worker_identity_is_visible_inside_the_pool() {
    let pool = ThreadPoolBuilder::new().worker_threads(3).build().unwrap();
    let executor = pool.executor().clone();

    let inside = pool.spawn(move || (executor.is_worker_thread(), current_worker().map(|id| id.index())));
    let (is_worker, index) = inside.wait().unwrap();

    assert!(is_worker);
    assert!(index.is_some_and(|i| i < 3));
    assert!(!pool.is_worker_thread());
    assert!(current_worker().is_none());
}

#[test]
fn workers_of_another_pool_are_not_ours() {
    let first = ThreadPoolBuilder::new().worker_threads(1).build().unwrap();
    let second = ThreadPoolBuilder::new().worker_threads(1).build().unwrap();
    let first_pool = first.executor().clone();

    let answer = second.spawn(move || first_pool.is_worker_thread());

    assert!(!answer.wait().unwrap());
}

#[test]
fn shutdown_from_inside_the_pool_returns() {
    let pool = ThreadPoolBuilder::new().worker_threads(2).build().unwrap();
    let executor = pool.executor().clone();

    let done = pool.spawn(move || executor.shutdown(true));

    assert!(done.wait_timeout(Duration::from_secs(5)).is_some());
    assert!(pool.is_shutdown());
}

#[test]
fn drain_from_a_worker_runs_the_queue_before_returning() {
    let pool = ThreadPoolBuilder::new().worker_threads(1).build().unwrap();
    let executor = pool.executor().clone();
    let finished = Arc::new(AtomicUsize::new(0));
    let counter = finished.clone();

    let seen = pool.spawn(move || {
        for _ in 0..5 {
            let counter = counter.clone();
            executor
                .submit(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                })
                .unwrap();
        }

        executor.shutdown(true);
        counter.load(Ordering::SeqCst)
    });

    assert_eq!(seen.wait_timeout(Duration::from_secs(5)).unwrap().unwrap(), 5);
    assert_eq!(finished.load(Ordering::SeqCst), 5);
}
