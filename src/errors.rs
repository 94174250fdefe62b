//! Error types for the object pool

use std::error::Error as StdError;
use std::time::Duration;
use thiserror::Error;

/// Failure reported by an [`ObjectFactory`](crate::ObjectFactory) while
/// creating or decommissioning an instance.
#[derive(Error, Debug)]
#[error("object factory failed: {message}")]
pub struct FactoryError {
    message: String,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl FactoryError {
    /// Create a factory error with a message only
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Create a factory error wrapping an underlying cause
    pub fn with_source<E>(message: impl Into<String>, source: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

#[derive(Error, Debug)]
pub enum PoolError {
    #[error(transparent)]
    Factory(#[from] FactoryError),

    #[error("Pool is exhausted - all {max} objects are checked out")]
    Exhausted { max: usize },

    #[error("Timed out after {0:?} waiting for an object")]
    Timeout(Duration),

    #[error("Pool has already been disposed")]
    Disposed,
}

impl PoolError {
    /// Whether the error came from the object factory rather than the pool policy
    pub fn is_factory(&self) -> bool {
        matches!(self, PoolError::Factory(_))
    }
}

pub type PoolResult<T> = Result<T, PoolError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_factory_error_keeps_source() {
        let err = FactoryError::with_source("connect", io::Error::other("refused"));
        assert_eq!(err.message(), "connect");
        assert_eq!(err.to_string(), "object factory failed: connect");
        assert!(err.source().is_some());
    }

    #[test]
    fn test_pool_error_is_transparent_over_factory() {
        let err: PoolError = FactoryError::new("boom").into();
        assert!(err.is_factory());
        assert_eq!(err.to_string(), "object factory failed: boom");
    }

    #[test]
    fn test_exhausted_message() {
        let err = PoolError::Exhausted { max: 3 };
        assert_eq!(err.to_string(), "Pool is exhausted - all 3 objects are checked out");
    }
}
