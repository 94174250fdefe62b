//! Soft and hard limited pools with a pre-filled minimum

use crate::config::PoolConfiguration;
use crate::errors::PoolResult;
use crate::factory::ObjectFactory;
use crate::pool::{Pool, Pooled, ResourceLimitingPool};

use std::fmt;
use std::time::Duration;
use tracing::debug;

macro_rules! delegate_pool {
    ($pool:ident) => {
        impl<F: ObjectFactory> Pool for $pool<F> {
            type Factory = F;

            fn get(&self) -> PoolResult<Pooled<F>> {
                self.inner.get()
            }

            fn try_get(&self) -> Option<Pooled<F>> {
                self.inner.try_get()
            }

            fn put(&self, object: Pooled<F>) {
                self.inner.put(object)
            }

            fn size(&self) -> usize {
                self.inner.size()
            }

            fn ready_size(&self) -> usize {
                self.inner.ready_size()
            }

            fn dispose(&self) {
                self.inner.dispose()
            }
        }

        impl<F: ObjectFactory> fmt::Debug for $pool<F> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_tuple(stringify!($pool)).field(&self.inner).finish()
            }
        }

        impl<F: ObjectFactory> $pool<F> {
            /// Create `min` instances up front; safe to call again, it only tops up
            pub fn initialize(&self) -> PoolResult<()> {
                let missing = self.inner.config().min.saturating_sub(self.inner.size());
                let created = self.inner.prefill(missing)?;
                debug!(pool = stringify!($pool), created, "initialized pool");
                Ok(())
            }

            /// The underlying policy engine
            pub fn inner(&self) -> &ResourceLimitingPool<F> {
                &self.inner
            }
        }
    };
}

/// Pool whose maximum is advisory.
///
/// Under contention it keeps creating instances past `max`; trimming
/// shrinks it back once the load drops.
///
/// ```
/// use limiting_pool::{DefaultObjectFactory, Pool, SoftResourceLimitingPool};
///
/// let pool = SoftResourceLimitingPool::new(DefaultObjectFactory::<u64>::new(), 2, 4);
/// pool.initialize().unwrap();
/// assert_eq!(pool.ready_size(), 2);
///
/// let held: Vec<_> = (0..6).map(|_| pool.get().unwrap()).collect();
/// assert_eq!(pool.size(), 6);
/// drop(held);
/// ```
pub struct SoftResourceLimitingPool<F: ObjectFactory> {
    inner: ResourceLimitingPool<F>,
}

impl<F: ObjectFactory> SoftResourceLimitingPool<F> {
    pub fn new(factory: F, min: usize, max: usize) -> Self {
        Self {
            inner: ResourceLimitingPool::new(factory, PoolConfiguration::soft(min, max)),
        }
    }

    /// Soft pool that trims idle and surplus instances every `interval`
    pub fn with_trim_interval(factory: F, min: usize, max: usize, interval: Duration) -> Self {
        Self {
            inner: ResourceLimitingPool::new(
                factory,
                PoolConfiguration::soft(min, max).with_trim_interval(interval),
            ),
        }
    }
}

delegate_pool!(SoftResourceLimitingPool);

/// Pool that never holds more than `max` instances; requests beyond the cap
/// fail with [`PoolError::Exhausted`](crate::PoolError::Exhausted).
///
/// ```
/// use limiting_pool::{DefaultObjectFactory, HardResourceLimitingPool, Pool, PoolError};
///
/// let pool = HardResourceLimitingPool::new(DefaultObjectFactory::<u64>::new(), 1, 2);
/// pool.initialize().unwrap();
///
/// let _a = pool.get().unwrap();
/// let _b = pool.get().unwrap();
/// assert!(matches!(pool.get(), Err(PoolError::Exhausted { max: 2 })));
/// ```
pub struct HardResourceLimitingPool<F: ObjectFactory> {
    inner: ResourceLimitingPool<F>,
}

impl<F: ObjectFactory> HardResourceLimitingPool<F> {
    pub fn new(factory: F, min: usize, max: usize) -> Self {
        Self {
            inner: ResourceLimitingPool::new(factory, PoolConfiguration::hard(min, max)),
        }
    }
}

delegate_pool!(HardResourceLimitingPool);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::PoolError;
    use crate::factory::DefaultObjectFactory;

    #[test]
    fn test_initialize_prefills_min() {
        let pool = HardResourceLimitingPool::new(DefaultObjectFactory::<u8>::new(), 2, 5);
        assert_eq!(pool.size(), 0);
        pool.initialize().unwrap();
        assert_eq!(pool.size(), 2);
        assert_eq!(pool.ready_size(), 2);
        assert_eq!(pool.inner().metrics().total_created, 2);
    }

    #[test]
    fn test_initialize_tops_up_only() {
        let pool = SoftResourceLimitingPool::new(DefaultObjectFactory::<u8>::new(), 2, 5);
        pool.initialize().unwrap();
        pool.initialize().unwrap();
        assert_eq!(pool.size(), 2);
    }

    #[test]
    fn test_min_above_max_is_clamped() {
        let pool = HardResourceLimitingPool::new(DefaultObjectFactory::<u8>::new(), 4, 2);
        pool.initialize().unwrap();
        assert_eq!(pool.size(), 2);
    }

    #[test]
    fn test_hard_pool_never_exceeds_max() {
        let pool = HardResourceLimitingPool::new(DefaultObjectFactory::<u8>::new(), 0, 3);
        let held: Vec<_> = (0..3).map(|_| pool.get().unwrap()).collect();
        assert!(matches!(pool.get(), Err(PoolError::Exhausted { .. })));
        assert_eq!(pool.size(), 3);
        drop(held);
        assert_eq!(pool.ready_size(), 3);
    }

    #[test]
    fn test_soft_pool_trims_back_to_max() {
        let pool = SoftResourceLimitingPool::new(DefaultObjectFactory::<u8>::new(), 1, 2);
        let held: Vec<_> = (0..4).map(|_| pool.get().unwrap()).collect();
        drop(held);
        assert_eq!(pool.size(), 4);

        assert_eq!(pool.inner().trim(), 2);
        assert_eq!(pool.size(), 2);
        // a second pass removes idle instances down to min
        assert_eq!(pool.inner().trim(), 1);
        assert_eq!(pool.size(), 1);
    }
}
