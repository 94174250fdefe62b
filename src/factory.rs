//! Object factories that create and decommission pooled instances

use crate::errors::FactoryError;
use std::fmt;
use std::marker::PhantomData;

/// Creates and destroys the instances managed by a pool.
///
/// A pool calls [`new_instance`](ObjectFactory::new_instance) whenever it needs
/// a fresh instance and [`decommission`](ObjectFactory::decommission) exactly
/// once when an instance leaves the pool for good (disposal, trimming, failed
/// validation). Creation happens outside the pool lock, so a slow factory
/// does not stall other callers.
///
/// # Examples
///
/// ```
/// use limiting_pool::{FactoryError, ObjectFactory};
///
/// struct Buffers;
///
/// impl ObjectFactory for Buffers {
///     type Object = Vec<u8>;
///
///     fn new_instance(&self) -> Result<Vec<u8>, FactoryError> {
///         Ok(Vec::with_capacity(4096))
///     }
///
///     fn recycle(&self, buf: &mut Vec<u8>) {
///         buf.clear();
///     }
/// }
///
/// let buf = Buffers.new_instance().unwrap();
/// assert_eq!(buf.capacity(), 4096);
/// ```
pub trait ObjectFactory: Send + Sync + 'static {
    /// The pooled instance type
    type Object: Send + 'static;

    /// Create a new instance
    fn new_instance(&self) -> Result<Self::Object, FactoryError>;

    /// Release an instance permanently
    fn decommission(&self, object: Self::Object) -> Result<(), FactoryError> {
        drop(object);
        Ok(())
    }

    /// Reset an instance before it goes back into the ready set
    fn recycle(&self, _object: &mut Self::Object) {}

    /// Check that a ready instance is still usable before handing it out
    fn validate(&self, _object: &Self::Object) -> bool {
        true
    }
}

/// Factory creating instances through [`Default`]
pub struct DefaultObjectFactory<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> DefaultObjectFactory<T> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for DefaultObjectFactory<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for DefaultObjectFactory<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefaultObjectFactory")
            .field("type", &std::any::type_name::<T>())
            .finish()
    }
}

impl<T: Default + Send + 'static> ObjectFactory for DefaultObjectFactory<T> {
    type Object = T;

    fn new_instance(&self) -> Result<T, FactoryError> {
        Ok(T::default())
    }
}

/// Factory backed by a closure
pub struct FnFactory<T, C> {
    create: C,
    _marker: PhantomData<fn() -> T>,
}

impl<T, C> FnFactory<T, C>
where
    C: Fn() -> Result<T, FactoryError>,
{
    pub fn new(create: C) -> Self {
        Self {
            create,
            _marker: PhantomData,
        }
    }
}

/// Build a factory from an infallible constructor
///
/// ```
/// use limiting_pool::{from_fn, ObjectFactory};
///
/// let factory = from_fn(|| String::from("ready"));
/// assert_eq!(factory.new_instance().unwrap(), "ready");
/// ```
pub fn from_fn<T, C>(
    create: C,
) -> FnFactory<T, impl Fn() -> Result<T, FactoryError> + Send + Sync + 'static>
where
    T: Send + 'static,
    C: Fn() -> T + Send + Sync + 'static,
{
    FnFactory::new(move || Ok(create()))
}

impl<T, C> ObjectFactory for FnFactory<T, C>
where
    T: Send + 'static,
    C: Fn() -> Result<T, FactoryError> + Send + Sync + 'static,
{
    type Object = T;

    fn new_instance(&self) -> Result<T, FactoryError> {
        (self.create)()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_default_factory() {
        let factory = DefaultObjectFactory::<Vec<u32>>::new();
        let v = factory.new_instance().unwrap();
        assert!(v.is_empty());
        assert!(factory.validate(&v));
        factory.decommission(v).unwrap();
    }

    #[test]
    fn test_fn_factory_counts_calls() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let factory = FnFactory::new(move || Ok(counter.fetch_add(1, Ordering::SeqCst)));

        assert_eq!(factory.new_instance().unwrap(), 0);
        assert_eq!(factory.new_instance().unwrap(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_fn_factory_propagates_failure() {
        let factory = FnFactory::<u8, _>::new(|| Err(FactoryError::new("no resources")));
        let err = factory.new_instance().unwrap_err();
        assert_eq!(err.message(), "no resources");
    }
}
