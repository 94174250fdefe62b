// Small demo binary; the library lives in lib.rs.
// Run the demos with: cargo run --example basic
// Set RUST_LOG=limiting_pool=debug to watch the pool lifecycle.

use limiting_pool::{DefaultObjectFactory, Pool, PoolResult, ResourceLimitingPool};
use tracing_subscriber::EnvFilter;

fn main() -> PoolResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== limiting_pool ===");
    println!("See demos/ directory for usage examples");
    println!();

    let pool = ResourceLimitingPool::with_limits(DefaultObjectFactory::<Vec<u8>>::new(), 3, true, true, 1000, 0);

    {
        let first = pool.get()?;
        let second = pool.get()?;
        println!("  Checked out objects {} and {}", first.id(), second.id());
        println!("  Size: {}, ready: {}", pool.size(), pool.ready_size());
    }

    println!("  After return - size: {}, ready: {}", pool.size(), pool.ready_size());
    pool.dispose();
    println!("  After dispose - size: {}", pool.size());
    Ok(())
}
