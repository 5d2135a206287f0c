use strand::task::CompletionSource;
use strand::{Error, ThreadPoolBuilder};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier, mpsc};
use std::task::Poll;
use std::thread;
use std::time::Duration;

#[test]
fn complete_twice_keeps_first_value() {
    let source = CompletionSource::new();
    let task = source.task();

    assert!(source.complete(1).is_ok());
    assert!(matches!(source.complete(2), Err(Error::AlreadyCompleted)));
    assert!(matches!(
        source.fail(Error::ExecutorStopped),
        Err(Error::AlreadyCompleted)
    ));

    assert_eq!(task.wait().unwrap(), 1);
}

#[test]
fn poll_reports_each_state() {
    let pending = CompletionSource::<i32>::new();
    assert!(pending.poll().is_pending());
    assert!(!pending.is_completed());

    let ready = CompletionSource::new();
    ready.complete(7).unwrap();
    assert!(matches!(ready.poll(), Poll::Ready(Ok(&7))));

    let failed = CompletionSource::<i32>::new();
    failed.fail(Error::NotReady).unwrap();
    assert!(matches!(failed.poll(), Poll::Ready(Err(Error::NotReady))));
    assert!(failed.is_completed());
}

#[test]
fn register_after_completion_runs_immediately_on_caller() {
    let source = CompletionSource::new();
    source.complete("done").unwrap();

    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let caller = thread::current().id();

    source
        .register_continuation(move || {
            assert_eq!(thread::current().id(), caller);
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn continuation_runs_on_completing_thread() {
    let source = CompletionSource::new();
    let (tx, rx) = mpsc::channel();

    source
        .register_continuation(move || {
            tx.send(thread::current().name().map(str::to_owned)).unwrap();
        })
        .unwrap();

    let writer = source.clone();
    thread::Builder::new()
        .name("producer".into())
        .spawn(move || writer.complete(5).unwrap())
        .unwrap()
        .join()
        .unwrap();

    assert_eq!(rx.recv().unwrap().as_deref(), Some("producer"));
}

#[test]
fn second_waiter_is_rejected() {
    let source = CompletionSource::<i32>::new();

    source.register_continuation(|| {}).unwrap();

    assert!(matches!(
        source.register_continuation(|| {}),
        Err(Error::AlreadyHasWaiter)
    ));
}

#[test]
fn complete_and_register_race_fires_exactly_once() {
    for _ in 0..500 {
        let source = CompletionSource::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let start = Arc::new(Barrier::new(2));

        let writer = source.clone();
        let writer_start = start.clone();
        let producer = thread::spawn(move || {
            writer_start.wait();
            writer.complete(1).unwrap();
        });

        let counter = calls.clone();
        start.wait();
        source
            .register_continuation(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();

        producer.join().unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}

#[test]
fn complete_on_runs_continuation_on_the_pool() {
    let pool = ThreadPoolBuilder::new().worker_threads(2).build().unwrap();
    let executor = pool.executor().clone();

    let source = CompletionSource::new();
    let (tx, rx) = mpsc::channel();

    let observer = executor.clone();
    source
        .register_continuation(move || tx.send(observer.is_worker_thread()).unwrap())
        .unwrap();

    source.complete_on(&executor, ()).unwrap();

    assert!(rx.recv_timeout(Duration::from_secs(5)).unwrap());
}

#[test]
fn settle_on_stopped_executor_runs_inline() {
    let pool = ThreadPoolBuilder::new().worker_threads(1).build().unwrap();
    pool.shutdown(true);

    let source = CompletionSource::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();

    source
        .register_continuation(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

    source.settle_on(pool.executor(), Ok(3)).unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn wait_blocks_until_completed_elsewhere() {
    let source = CompletionSource::new();
    let task = source.task();

    let writer = source.clone();
    let producer = thread::spawn(move || {
        thread::sleep(Duration::from_millis(20));
        writer.complete(String::from("late")).unwrap();
    });

    assert!(task.wait_timeout(Duration::from_millis(1)).is_none());
    assert_eq!(task.wait().unwrap(), "late");

    producer.join().unwrap();
}

#[test]
fn bound_source_reports_its_executor() {
    let pool = ThreadPoolBuilder::new().worker_threads(1).build().unwrap();

    let bound = CompletionSource::<u8>::bound(pool.executor().clone());
    assert!(bound.task().executor().is_some());

    let unbound = CompletionSource::<u8>::new();
    assert!(unbound.task().executor().is_none());
}
