//! Worker threads sharing a strictly limited, blocking pool

use limiting_pool::{from_fn, Pool, PoolConfiguration, ResourceLimitingPool};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== limiting_pool - Blocking Example ===\n");

    let serial = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&serial);
    let factory = from_fn(move || format!("connection-{}", counter.fetch_add(1, Ordering::SeqCst)));

    let pool = Arc::new(ResourceLimitingPool::new(
        factory,
        PoolConfiguration::new()
            .with_max(3)
            .with_max_strict(true)
            .with_blocking(true)
            .with_block_timeout(Duration::from_secs(5)),
    ));

    let workers: Vec<_> = (0..8)
        .map(|worker| {
            let pool = Arc::clone(&pool);
            thread::spawn(move || {
                let conn = pool.get().unwrap();
                println!("   worker {} using {}", worker, *conn);
                thread::sleep(Duration::from_millis(50));
            })
        })
        .collect();

    for worker in workers {
        worker.join().unwrap();
    }

    let metrics = pool.metrics();
    println!("\n   Created: {}", metrics.total_created);
    println!("   Gets that had to wait: {}", metrics.blocked_gets);
    println!("   Size: {}, ready: {}", pool.size(), pool.ready_size());
}
