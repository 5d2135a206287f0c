//! Example: Fan out timer-driven tasks and join them
//!
//! Each task sleeps `100 * i` ms without holding a worker, squares `i` on
//! the pool, then formats the result. Run with `RUST_LOG=strand=debug` to
//! see the pool lifecycle.

use strand::task::join_all;
use strand::time::{TimerService, sleep};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

#[strand::main(worker_threads = 4)]
fn main() -> strand::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let timers = TimerService::new()?;
    let start = Instant::now();

    let tasks = (1..100u64).map(|i| {
        let spawner = executor.clone();

        sleep(&timers, Duration::from_millis(100 * i))
            .and_then(&executor, move |()| spawner.spawn(move || i * i))
            .then(&executor, |square| {
                let text = square.to_string();
                print!("{text} ");
                text
            })
    });

    let results = join_all(tasks).wait()?;

    println!();
    println!("{} results in {:?}", results.len(), start.elapsed());

    Ok(())
}
