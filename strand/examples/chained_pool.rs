//! Example: Chained continuations on a fixed-size pool
//!
//! Unlike `fan_out`, every first step blocks its worker, so the four
//! workers are the bottleneck.

use strand::ThreadPoolBuilder;
use strand::task::JoinSet;
use std::thread;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

fn main() -> strand::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Create a pool with 4 worker threads
    let pool = ThreadPoolBuilder::new().worker_threads(4).build()?;

    let mut set = JoinSet::new();

    for i in 1..100u64 {
        set.push(
            pool.spawn(move || thread::sleep(Duration::from_millis(10 * i)))
                .then(&pool, move |()| i * i)
                .then(&pool, |square| print!("{square} ")),
        );
    }

    set.join_unit().wait()?;
    println!();

    Ok(())
}
