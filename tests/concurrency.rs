mod common;

use common::{RecordingFactory, TestObject};
use limiting_pool::{FactoryError, ObjectFactory, Pool, PoolConfiguration, PoolError, ResourceLimitingPool};
use std::sync::Barrier;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

#[test]
fn fourth_get_blocks_until_a_put() {
    let pool = ResourceLimitingPool::with_limits(RecordingFactory::new(), 3, true, true, 0, 0);

    let a = pool.get().unwrap();
    let _b = pool.get().unwrap();
    let _c = pool.get().unwrap();
    let released = a.id();

    crossbeam::scope(|s| {
        let waiter = s.spawn(|_| {
            let started = Instant::now();
            let obj = pool.get().unwrap();
            (obj.id(), started.elapsed())
        });

        thread::sleep(Duration::from_millis(50));
        assert_eq!(pool.size(), 3);
        assert_eq!(pool.metrics().blocked_gets, 1);

        pool.put(a);
        let (id, waited) = waiter.join().unwrap();
        assert_eq!(id, released);
        assert!(waited >= Duration::from_millis(25));
    })
    .unwrap();

    assert_eq!(pool.size(), 3);
    assert_eq!(pool.factory().count("new_instance"), 3);
}

#[test]
fn dispose_wakes_blocked_callers() {
    let pool = ResourceLimitingPool::with_limits(RecordingFactory::new(), 1, true, true, 0, 0);
    let held = pool.get().unwrap();

    crossbeam::scope(|s| {
        let waiter = s.spawn(|_| pool.get().map(|p| p.id()));
        thread::sleep(Duration::from_millis(30));
        pool.dispose();
        assert!(matches!(waiter.join().unwrap(), Err(PoolError::Disposed)));
    })
    .unwrap();

    drop(held);
    assert_eq!(pool.size(), 0);
    assert_eq!(pool.factory().count("decommission"), 1);
}

/// Factory whose first construction parks on a gate and then fails
struct GatedFactory {
    calls: AtomicUsize,
    entered: Barrier,
    release: Barrier,
}

impl ObjectFactory for GatedFactory {
    type Object = TestObject;

    fn new_instance(&self) -> Result<TestObject, FactoryError> {
        let serial = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if serial == 1 {
            self.entered.wait();
            self.release.wait();
            return Err(FactoryError::new("first construction refused"));
        }
        Ok(TestObject { serial })
    }
}

#[test]
fn failed_construction_wakes_a_blocked_caller() {
    let pool = ResourceLimitingPool::new(
        GatedFactory {
            calls: AtomicUsize::new(0),
            entered: Barrier::new(2),
            release: Barrier::new(2),
        },
        PoolConfiguration::new()
            .with_max(1)
            .with_max_strict(true)
            .with_blocking(true)
            .with_block_timeout(Duration::from_secs(5)),
    );

    crossbeam::scope(|s| {
        let builder = s.spawn(|_| pool.get().map(|p| p.serial));
        pool.factory().entered.wait();
        assert_eq!(pool.size(), 1);

        let waiter = s.spawn(|_| {
            let started = Instant::now();
            let serial = pool.get().map(|p| p.serial);
            (serial, started.elapsed())
        });
        thread::sleep(Duration::from_millis(50));
        assert_eq!(pool.metrics().blocked_gets, 1);

        pool.factory().release.wait();
        assert!(builder.join().unwrap().unwrap_err().is_factory());

        let (serial, waited) = waiter.join().unwrap();
        assert_eq!(serial.unwrap(), 2);
        assert!(waited < Duration::from_secs(1));
    })
    .unwrap();

    assert_eq!(pool.size(), 1);
    assert_eq!(pool.ready_size(), 1);
    assert_eq!(pool.metrics().factory_failures, 1);
}

#[test]
fn strict_limit_holds_under_contention() {
    const THREADS: usize = 8;
    const ROUNDS: usize = 500;
    const MAX: usize = 4;

    let pool = ResourceLimitingPool::new(
        RecordingFactory::new(),
        PoolConfiguration::new()
            .with_max(MAX)
            .with_max_strict(true)
            .with_blocking(true)
            .with_block_timeout(Duration::from_secs(10)),
    );
    let peak = AtomicUsize::new(0);

    crossbeam::scope(|s| {
        for _ in 0..THREADS {
            s.spawn(|_| {
                for _ in 0..ROUNDS {
                    let obj = pool.get().unwrap();
                    peak.fetch_max(pool.size(), Ordering::SeqCst);
                    thread::yield_now();
                    pool.put(obj);
                }
            });
        }
    })
    .unwrap();

    assert!(peak.load(Ordering::SeqCst) <= MAX);
    assert_eq!(pool.size(), pool.ready_size());
    assert!(pool.size() <= MAX);

    let metrics = pool.metrics();
    assert_eq!(metrics.total_gets, THREADS * ROUNDS);
    assert_eq!(metrics.total_puts, THREADS * ROUNDS);
    assert_eq!(metrics.timeouts, 0);
}

#[test]
fn soft_pool_grows_without_blocking() {
    let pool = ResourceLimitingPool::new(RecordingFactory::new(), PoolConfiguration::soft(0, 2));
    let barrier = std::sync::Barrier::new(6);

    crossbeam::scope(|s| {
        for _ in 0..6 {
            s.spawn(|_| {
                let obj = pool.get().unwrap();
                barrier.wait();
                drop(obj);
            });
        }
    })
    .unwrap();

    assert_eq!(pool.size(), 6);
    assert_eq!(pool.ready_size(), 6);
    assert_eq!(pool.metrics().blocked_gets, 0);
}
