use strand::task::{CompletionSource, JoinPolicy, JoinSet, Task, join_all, join_all_with, join_unit};
use strand::time::{TimerService, sleep};
use strand::{Error, join};
use std::time::{Duration, Instant};

#[strand::test(worker_threads = 3)]
fn join_all_preserves_input_order() {
    let timers = TimerService::new().unwrap();

    let t1 = sleep(&timers, Duration::from_millis(100)).then(&executor, |()| 1);
    let t2 = sleep(&timers, Duration::from_millis(50)).then(&executor, |()| 2);
    let t3 = executor.spawn(|| 3);

    assert_eq!(join_all([t1, t2, t3]).wait().unwrap(), vec![1, 2, 3]);
}

#[strand::test]
fn fail_fast_does_not_wait_for_slow_members() {
    let timers = TimerService::new().unwrap();
    let start = Instant::now();

    let slow = sleep(&timers, Duration::from_secs(3)).then(&executor, |()| 1);
    let failing = executor.try_spawn(|| Err::<i32, _>("bad input"));

    let error = join_all([slow, failing]).wait().unwrap_err();

    assert!(start.elapsed() < Duration::from_secs(2));
    assert_eq!(error.to_string(), "bad input");
}

#[strand::test]
fn wait_all_collects_every_failure() {
    let tasks = vec![
        executor.spawn(|| 0),
        Task::failed(Error::NotReady),
        executor.spawn(|| 2),
        executor.try_spawn(|| Err::<i32, _>("third")),
    ];

    let error = join_all_with(JoinPolicy::WaitAll, tasks).wait().unwrap_err();

    let Error::Aggregate(failures) = &error else {
        panic!("expected an aggregate failure, got {error:?}");
    };

    let indices: Vec<usize> = failures.iter().map(|(index, _)| *index).collect();
    assert_eq!(indices, vec![1, 3]);
    assert!(matches!(failures[0].1, Error::NotReady));
}

#[strand::test]
fn wait_all_succeeds_like_fail_fast() {
    let tasks = (0..10).map(|i| executor.spawn(move || i * 10));

    let values = join_all_with(JoinPolicy::WaitAll, tasks).wait().unwrap();

    assert_eq!(values, (0..10).map(|i| i * 10).collect::<Vec<_>>());
}

#[test]
fn empty_join_completes_immediately() {
    let joined = join_all(Vec::<Task<i32>>::new());

    assert!(joined.is_ready());
    assert!(joined.wait().unwrap().is_empty());
}

#[test]
fn member_with_a_waiter_fails_the_join() {
    let source = CompletionSource::<i32>::new();
    let task = source.task();
    source.register_continuation(|| {}).unwrap();

    let joined = join_all([task]);

    assert!(matches!(joined.result(), Some(Err(Error::AlreadyHasWaiter))));
}

#[strand::test]
fn join_set_collects_pushed_tasks() {
    let mut set = JoinSet::new();
    assert!(set.is_empty());

    for i in 0..5u32 {
        set.push(executor.spawn(move || i + 1));
    }
    set.extend([Task::ready(100)]);

    assert_eq!(set.len(), 6);
    assert_eq!(set.join().wait().unwrap(), vec![1, 2, 3, 4, 5, 100]);
}

#[strand::test]
fn join_unit_discards_values() {
    let tasks: Vec<_> = (0..4).map(|i| executor.spawn(move || i)).collect();

    assert!(join_unit(tasks).wait().is_ok());
}

#[strand::test]
fn zip_pairs_two_tasks() {
    let left = executor.spawn(|| "left");
    let right = executor.spawn(|| 2.5);

    assert_eq!(left.zip(&right).wait().unwrap(), ("left", 2.5));
}

#[strand::test]
fn zip_fails_with_either_side() {
    let left = executor.spawn(|| 1);
    let right = Task::<u8>::failed(Error::NotReady);

    assert!(matches!(left.zip(&right).wait(), Err(Error::NotReady)));
}

#[strand::test]
fn join_macro_builds_a_flat_tuple() {
    let a = executor.spawn(|| 1);
    let b = executor.spawn(|| "two");
    let c = executor.spawn(|| 3.0);

    assert_eq!(join!(a, b, c).wait().unwrap(), (1, "two", 3.0));
    assert_eq!(join!(executor.spawn(|| 'x')).wait().unwrap(), 'x');
    assert!(join!().is_ready());
}
