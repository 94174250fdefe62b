//! Async checkout and background trimming

use limiting_pool::{DefaultObjectFactory, Pool, PoolConfiguration, ResourceLimitingPool};
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() {
    println!("=== limiting_pool - Async Examples ===\n");

    let pool = Arc::new(ResourceLimitingPool::new(
        DefaultObjectFactory::<Vec<u8>>::new(),
        PoolConfiguration::from_millis(4, true, true, 1000, 100),
    ));
    let trimmer = pool.spawn_trimmer();

    let tasks: Vec<_> = (0..10)
        .map(|task| {
            let pool = Arc::clone(&pool);
            tokio::spawn(async move {
                let mut buf = pool.get_async().await.unwrap();
                buf.push(task as u8);
                tokio::time::sleep(Duration::from_millis(20)).await;
            })
        })
        .collect();

    for task in tasks {
        task.await.unwrap();
    }
    println!("   After load - size: {}, ready: {}", pool.size(), pool.ready_size());

    tokio::time::sleep(Duration::from_millis(350)).await;
    println!("   After idle trimming - size: {}", pool.size());

    pool.dispose();
    if let Some(trimmer) = trimmer {
        trimmer.await.unwrap();
    }
    println!("   Disposed");
}
