//! # limiting_pool
//!
//! Thread-safe, resource limiting object pool for Rust.
//!
//! ## Features
//!
//! - One policy engine, [`ResourceLimitingPool`], configured with a maximum
//!   size, strict or advisory limits, blocking checkout and a block timeout
//! - Soft and hard presets with an eagerly created minimum
//! - Automatic return of objects via RAII (Drop trait)
//! - Pluggable [`ObjectFactory`] with recycle and validation hooks
//! - Generational trimming of idle instances, lazily or on a tokio task
//! - Async checkout with timeout
//! - Metrics and Prometheus export
//!
//! ## Quick Start
//!
//! ```rust
//! use limiting_pool::{DefaultObjectFactory, HardResourceLimitingPool, Pool};
//!
//! let pool = HardResourceLimitingPool::new(DefaultObjectFactory::<Vec<u8>>::new(), 0, 3);
//! {
//!     let mut buf = pool.get().unwrap();
//!     buf.push(1);
//!     // Object automatically returned when `buf` goes out of scope
//! }
//! assert_eq!(pool.ready_size(), 1);
//! ```

mod config;
mod errors;
mod factory;
mod metrics;
mod pool;
mod presets;
mod trim;

pub use config::PoolConfiguration;
pub use errors::{FactoryError, PoolError, PoolResult};
pub use factory::{from_fn, DefaultObjectFactory, FnFactory, ObjectFactory};
pub use metrics::{MetricsExporter, PoolMetrics};
pub use pool::{Pool, Pooled, ResourceLimitingPool};
pub use presets::{HardResourceLimitingPool, SoftResourceLimitingPool};
