//! Example: Retry with interval

use strand::time::TimerService;
use strand::tools::retry;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[strand::main]
fn main() -> strand::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let timers = TimerService::new()?;

    // Shared counter for attempts
    let attempts = Arc::new(AtomicUsize::new(0));
    let attempts_clone = attempts.clone();
    let spawner = executor.clone();

    // Retry the operation up to 3 times with interval
    let result = retry(&executor, 3, move || {
        let attempts = attempts_clone.clone();
        spawner.try_spawn(move || {
            let n = attempts.fetch_add(1, Ordering::SeqCst);
            println!("Attempt {}", n + 1);
            Err::<(), &str>("fail")
        })
    })
    .set_interval(&timers, Duration::from_millis(100))
    .run()
    .wait();

    println!("Result: {:?}", result);
    Ok(())
}
