//! Basic usage examples for the resource limiting pools

use limiting_pool::{
    DefaultObjectFactory, HardResourceLimitingPool, Pool, PoolConfiguration, PoolError,
    ResourceLimitingPool, SoftResourceLimitingPool,
};

fn main() {
    println!("=== limiting_pool - Basic Examples ===\n");

    // Example 1: Soft limited pool
    soft_pool();

    // Example 2: Hard limited pool
    hard_pool();

    // Example 3: Try methods
    try_methods();

    // Example 4: Metrics
    metrics();
}

fn soft_pool() {
    println!("1. Soft Pool:");
    let pool = SoftResourceLimitingPool::new(DefaultObjectFactory::<String>::new(), 2, 4);
    pool.initialize().unwrap();
    println!("   Pre-filled: {}", pool.ready_size());

    let held: Vec<_> = (0..6).map(|_| pool.get().unwrap()).collect();
    println!("   Size under load: {} (max is advisory)", pool.size());
    drop(held);

    pool.inner().trim();
    println!("   Size after trim: {}\n", pool.size());
}

fn hard_pool() {
    println!("2. Hard Pool:");
    let pool = HardResourceLimitingPool::new(DefaultObjectFactory::<Vec<u8>>::new(), 0, 2);

    let _a = pool.get().unwrap();
    let _b = pool.get().unwrap();
    match pool.get() {
        Err(PoolError::Exhausted { max }) => println!("   Third get rejected, max is {}", max),
        other => println!("   Unexpected: {:?}", other.map(|p| p.id())),
    }
    println!();
}

fn try_methods() {
    println!("3. Try Methods:");
    let pool = ResourceLimitingPool::new(
        DefaultObjectFactory::<u32>::new(),
        PoolConfiguration::from_millis(1, true, true, 0, 0),
    );

    let obj1 = pool.try_get();
    assert!(obj1.is_some());
    println!("   First try: Success");

    // a blocking get would wait here, try_get never does
    let obj2 = pool.try_get();
    assert!(obj2.is_none());
    println!("   Second try: None (pool at capacity)");

    drop(obj1);

    let obj3 = pool.try_get();
    assert!(obj3.is_some());
    println!("   Third try: Success\n");
}

fn metrics() {
    println!("4. Metrics:");
    let pool = ResourceLimitingPool::new(DefaultObjectFactory::<u32>::new(), PoolConfiguration::hard(0, 5));

    {
        let _obj1 = pool.get().unwrap();
        let _obj2 = pool.get().unwrap();
        let metrics = pool.metrics();
        println!("   Utilization: {:.1}%", metrics.utilization * 100.0);
        println!("   Checked out: {}, Ready: {}", metrics.checked_out, metrics.ready_size);
    }

    let mut exported: Vec<_> = pool.export_metrics().into_iter().collect();
    exported.sort();
    println!("\n   Metrics:");
    for (key, value) in exported {
        println!("     {}: {}", key, value);
    }
}
