//! Resource limiting object pool

use crate::config::PoolConfiguration;
use crate::errors::{PoolError, PoolResult};
use crate::factory::ObjectFactory;
use crate::metrics::{MetricsExporter, MetricsTracker, PoolMetrics};
use crate::trim::{Entry, Generations, TrimBounds};

use parking_lot::{Condvar, Mutex};
use std::collections::HashMap;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Weak};
use std::time::Instant;
use tracing::{debug, trace, warn};

/// Check-out/check-in contract shared by every pool variant
pub trait Pool {
    type Factory: ObjectFactory;

    /// Acquire an instance, creating, waiting or failing according to policy
    fn get(&self) -> PoolResult<Pooled<Self::Factory>>;

    /// Acquire an instance without ever waiting
    fn try_get(&self) -> Option<Pooled<Self::Factory>> {
        self.get().ok()
    }

    /// Return an instance. Dropping the guard does the same.
    fn put(&self, object: Pooled<Self::Factory>);

    /// Instances owned by the pool, ready or checked out
    fn size(&self) -> usize;

    /// Instances waiting in the ready set
    fn ready_size(&self) -> usize;

    /// Decommission all ready instances and refuse further checkouts
    fn dispose(&self);
}

/// A checked-out instance that returns to its pool when dropped
pub struct Pooled<F: ObjectFactory> {
    value: Option<F::Object>,
    id: usize,
    shared: Arc<Shared<F>>,
}

impl<F: ObjectFactory> Pooled<F> {
    fn new(value: F::Object, id: usize, shared: Arc<Shared<F>>) -> Self {
        Self {
            value: Some(value),
            id,
            shared,
        }
    }

    /// Identity of the instance within its pool; stable across checkouts
    pub fn id(&self) -> usize {
        self.id
    }
}

impl<F: ObjectFactory> Deref for Pooled<F> {
    type Target = F::Object;

    fn deref(&self) -> &Self::Target {
        self.value.as_ref().expect("Value already returned")
    }
}

impl<F: ObjectFactory> DerefMut for Pooled<F> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.value.as_mut().expect("Value already returned")
    }
}

impl<F: ObjectFactory> Drop for Pooled<F> {
    fn drop(&mut self) {
        if let Some(value) = self.value.take() {
            self.shared.release(value, self.id);
        }
    }
}

impl<F> fmt::Debug for Pooled<F>
where
    F: ObjectFactory,
    F::Object: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pooled")
            .field("id", &self.id)
            .field("value", &self.value)
            .finish()
    }
}

struct State<T> {
    ready: Generations<T>,
    size: usize,
    next_id: usize,
    disposed: bool,
}

enum Checkout<T> {
    Ready(Entry<T>),
    Create(usize),
}

pub(crate) struct Shared<F: ObjectFactory> {
    factory: F,
    config: PoolConfiguration,
    min: usize,
    state: Mutex<State<F::Object>>,
    slot_freed: Condvar,
    metrics: MetricsTracker,
}

/// A slot counted in `size` whose instance is still being built
struct Reservation<'a, F: ObjectFactory> {
    shared: &'a Shared<F>,
    armed: bool,
}

impl<F: ObjectFactory> Reservation<'_, F> {
    fn commit(mut self) {
        self.armed = false;
    }
}

impl<F: ObjectFactory> Drop for Reservation<'_, F> {
    fn drop(&mut self) {
        if self.armed {
            self.shared.state.lock().size -= 1;
            self.shared.slot_freed.notify_one();
        }
    }
}

impl<F: ObjectFactory> Shared<F> {
    fn has_room(&self, size: usize) -> bool {
        !self.config.is_bounded() || size < self.config.max || !self.config.max_strict
    }

    fn acquire(self: &Arc<Self>, may_block: bool) -> PoolResult<Pooled<F>> {
        let deadline = self.config.block_timeout.map(|timeout| Instant::now() + timeout);
        let mut waited = false;

        loop {
            let mut doomed = Vec::new();
            let outcome = self.checkout(may_block, deadline, &mut waited, &mut doomed);
            self.decommission_all(doomed);

            match outcome? {
                Checkout::Ready(entry) => {
                    // validation may be slow, the lock is not held here
                    if !self.factory.validate(&entry.object) {
                        debug!(id = entry.id, "ready object failed validation");
                        MetricsTracker::incr(&self.metrics.validation_failures);
                        self.state.lock().size -= 1;
                        self.slot_freed.notify_one();
                        self.decommission_all(vec![entry.object]);
                        continue;
                    }
                    MetricsTracker::incr(&self.metrics.gets);
                    debug!(id = entry.id, "got an object from the pool");
                    return Ok(Pooled::new(entry.object, entry.id, Arc::clone(self)));
                }
                Checkout::Create(id) => {
                    let reservation = Reservation {
                        shared: self,
                        armed: true,
                    };
                    let object = self.create(reservation, id)?;
                    MetricsTracker::incr(&self.metrics.gets);
                    debug!(id, "got an object from the pool");
                    return Ok(Pooled::new(object, id, Arc::clone(self)));
                }
            }
        }
    }

    /// Claim a ready entry or a slot to build one in; the only part of a
    /// checkout that runs under the lock
    fn checkout(
        &self,
        may_block: bool,
        deadline: Option<Instant>,
        waited: &mut bool,
        doomed: &mut Vec<F::Object>,
    ) -> PoolResult<Checkout<F::Object>> {
        let mut state = self.state.lock();
        loop {
            if state.disposed {
                return Err(PoolError::Disposed);
            }
            self.trim_if_due(&mut state, doomed);

            if let Some(entry) = state.ready.pop() {
                return Ok(Checkout::Ready(entry));
            }

            if self.has_room(state.size) {
                state.size += 1;
                let id = state.next_id;
                state.next_id += 1;
                return Ok(Checkout::Create(id));
            }

            if !self.config.blocking {
                MetricsTracker::incr(&self.metrics.exhausted);
                return Err(PoolError::Exhausted { max: self.config.max });
            }
            if !may_block {
                return Err(PoolError::Exhausted { max: self.config.max });
            }

            if !*waited {
                *waited = true;
                MetricsTracker::incr(&self.metrics.blocked);
                debug!(size = state.size, "pool at capacity, waiting for a free slot");
            }
            match (deadline, self.config.block_timeout) {
                (Some(deadline), Some(timeout)) => {
                    if Instant::now() >= deadline {
                        MetricsTracker::incr(&self.metrics.timeouts);
                        return Err(PoolError::Timeout(timeout));
                    }
                    self.slot_freed.wait_until(&mut state, deadline);
                }
                _ => self.slot_freed.wait(&mut state),
            }
        }
    }

    /// Build an instance for a reserved slot; the lock is not held here
    fn create(&self, reservation: Reservation<'_, F>, id: usize) -> PoolResult<F::Object> {
        match self.factory.new_instance() {
            Ok(object) => {
                reservation.commit();
                MetricsTracker::incr(&self.metrics.created);
                debug!(id, "created a new object from the object factory");
                Ok(object)
            }
            Err(err) => {
                MetricsTracker::incr(&self.metrics.factory_failures);
                debug!(id, error = %err, "object factory failed to create an object");
                Err(err.into())
            }
        }
    }

    fn release(&self, mut object: F::Object, id: usize) {
        self.factory.recycle(&mut object);

        let mut doomed = Vec::new();
        let mut state = self.state.lock();
        MetricsTracker::incr(&self.metrics.puts);
        if state.disposed {
            state.size -= 1;
            doomed.push(object);
        } else {
            state.ready.push(Entry { id, object });
            self.slot_freed.notify_one();
            self.trim_if_due(&mut state, &mut doomed);
        }
        drop(state);

        debug!(id, "put an object back into the pool");
        self.decommission_all(doomed);
    }

    fn prefill(&self, count: usize) -> PoolResult<usize> {
        let mut created = 0;
        for _ in 0..count {
            let id = {
                let mut state = self.state.lock();
                if state.disposed {
                    return Err(PoolError::Disposed);
                }
                if self.config.is_bounded() && state.size >= self.config.max {
                    break;
                }
                state.size += 1;
                let id = state.next_id;
                state.next_id += 1;
                id
            };
            let reservation = Reservation {
                shared: self,
                armed: true,
            };
            let object = self.create(reservation, id)?;

            let mut state = self.state.lock();
            if state.disposed {
                state.size -= 1;
                drop(state);
                self.decommission_all(vec![object]);
                return Err(PoolError::Disposed);
            }
            state.ready.push(Entry { id, object });
            self.slot_freed.notify_one();
            created += 1;
        }
        debug!(created, "pre-filled pool");
        Ok(created)
    }

    fn trim_if_due(&self, state: &mut State<F::Object>, doomed: &mut Vec<F::Object>) {
        if state.ready.is_due(self.config.trim_interval) {
            self.trim_locked(state, doomed);
        }
    }

    fn trim_locked(&self, state: &mut State<F::Object>, doomed: &mut Vec<F::Object>) -> usize {
        let bounds = TrimBounds {
            min: self.min,
            max: self.config.max,
        };
        let removed = state.ready.trim(state.size, bounds);
        let count = removed.len();
        state.size -= count;
        doomed.extend(removed.into_iter().map(|entry| entry.object));

        if count > 0 {
            MetricsTracker::add(&self.metrics.trimmed, count);
            self.slot_freed.notify_all();
        }
        trace!(trimmed = count, size = state.size, "trimmed idle objects");
        count
    }

    fn trim(&self) -> usize {
        let mut doomed = Vec::new();
        let count = {
            let mut state = self.state.lock();
            if state.disposed {
                return 0;
            }
            self.trim_locked(&mut state, &mut doomed)
        };
        self.decommission_all(doomed);
        count
    }

    fn dispose(&self) {
        let drained = {
            let mut state = self.state.lock();
            if state.disposed {
                return;
            }
            state.disposed = true;
            let drained = state.ready.drain();
            state.size -= drained.len();
            self.slot_freed.notify_all();
            drained
        };

        debug!(count = drained.len(), "disposing pool");
        self.decommission_all(drained.into_iter().map(|entry| entry.object).collect());
    }

    fn is_disposed(&self) -> bool {
        self.state.lock().disposed
    }

    fn decommission_all(&self, objects: Vec<F::Object>) {
        for object in objects {
            MetricsTracker::incr(&self.metrics.decommissioned);
            match self.factory.decommission(object) {
                Ok(()) => debug!("decommissioned an object"),
                Err(err) => warn!(error = %err, "failed to decommission object"),
            }
        }
    }

    fn counts(&self) -> (usize, usize) {
        let state = self.state.lock();
        (state.size, state.ready.len())
    }
}

/// Object pool with a configurable size limit policy.
///
/// The pool grows on demand. With `max_strict` unset, `max` is advisory: the
/// pool keeps creating instances under load and trimming brings it back
/// down. With `max_strict` set, `max` is a hard cap and callers beyond it
/// either fail immediately or wait for a slot (`blocking`), optionally
/// bounded by `block_timeout`. A `max` of 0 disables the limit.
///
/// All slot bookkeeping happens under one lock; instance construction runs
/// outside it.
///
/// # Examples
///
/// ```
/// use limiting_pool::{DefaultObjectFactory, Pool, PoolConfiguration, ResourceLimitingPool};
///
/// let pool = ResourceLimitingPool::new(
///     DefaultObjectFactory::<Vec<u8>>::new(),
///     PoolConfiguration::from_millis(3, true, false, 0, 0),
/// );
///
/// let a = pool.get().unwrap();
/// assert_eq!(pool.size(), 1);
/// assert_eq!(pool.ready_size(), 0);
///
/// pool.put(a);
/// assert_eq!(pool.ready_size(), 1);
/// ```
pub struct ResourceLimitingPool<F: ObjectFactory> {
    shared: Arc<Shared<F>>,
}

impl<F: ObjectFactory> ResourceLimitingPool<F> {
    /// Create an empty pool; nothing is created until the first `get`
    pub fn new(factory: F, config: PoolConfiguration) -> Self {
        let min = config.effective_min();
        Self {
            shared: Arc::new(Shared {
                factory,
                config,
                min,
                state: Mutex::new(State {
                    ready: Generations::new(),
                    size: 0,
                    next_id: 1,
                    disposed: false,
                }),
                slot_freed: Condvar::new(),
                metrics: MetricsTracker::new(),
            }),
        }
    }

    /// Create a pool from the classic parameter list (timeouts in milliseconds)
    pub fn with_limits(
        factory: F,
        max: usize,
        max_strict: bool,
        blocking: bool,
        block_timeout_ms: u64,
        trim_interval_ms: u64,
    ) -> Self {
        Self::new(
            factory,
            PoolConfiguration::from_millis(max, max_strict, blocking, block_timeout_ms, trim_interval_ms),
        )
    }

    pub fn config(&self) -> &PoolConfiguration {
        &self.shared.config
    }

    pub fn factory(&self) -> &F {
        &self.shared.factory
    }

    /// Instances currently handed out
    pub fn checked_out(&self) -> usize {
        let (size, ready) = self.shared.counts();
        size - ready
    }

    pub fn is_disposed(&self) -> bool {
        self.shared.is_disposed()
    }

    /// Eagerly create up to `count` ready instances, never exceeding `max`.
    /// Returns how many were created.
    pub fn prefill(&self, count: usize) -> PoolResult<usize> {
        self.shared.prefill(count)
    }

    /// Decommission idle and surplus ready instances now.
    /// Returns how many were removed.
    pub fn trim(&self) -> usize {
        self.shared.trim()
    }

    /// Get pool metrics
    pub fn metrics(&self) -> PoolMetrics {
        let (size, ready) = self.shared.counts();
        self.shared.metrics.snapshot(size, ready, self.shared.config.max)
    }

    /// Export metrics
    pub fn export_metrics(&self) -> HashMap<String, String> {
        self.metrics().export()
    }

    /// Export metrics in Prometheus format
    pub fn export_metrics_prometheus(
        &self,
        pool_name: &str,
        tags: Option<&HashMap<String, String>>,
    ) -> String {
        MetricsExporter::export_prometheus(&self.metrics(), pool_name, tags)
    }

    /// Acquire an instance without tying up a thread while waiting.
    ///
    /// Blocking pools retry every `poll_interval`, bounded by `block_timeout`.
    pub async fn get_async(&self) -> PoolResult<Pooled<F>> {
        let config = &self.shared.config;
        let poll = async {
            let mut waited = false;
            loop {
                match self.shared.acquire(false) {
                    Err(PoolError::Exhausted { .. }) if config.blocking => {
                        if !waited {
                            waited = true;
                            MetricsTracker::incr(&self.shared.metrics.blocked);
                            debug!("pool at capacity, polling for a free slot");
                        }
                        tokio::time::sleep(config.poll_interval).await;
                    }
                    other => return other,
                }
            }
        };

        match config.block_timeout {
            Some(timeout) => tokio::time::timeout(timeout, poll).await.map_err(|_| {
                MetricsTracker::incr(&self.shared.metrics.timeouts);
                PoolError::Timeout(timeout)
            })?,
            None => poll.await,
        }
    }

    /// Run `trim` every `trim_interval` on the current tokio runtime.
    ///
    /// Returns `None` when trimming is disabled or when called outside a
    /// tokio runtime; lazy trimming on `get`/`put` still applies then. The
    /// task stops once the pool is disposed or dropped.
    pub fn spawn_trimmer(&self) -> Option<tokio::task::JoinHandle<()>> {
        let interval = self.shared.config.trim_interval?;
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            warn!("no tokio runtime, background trimming not started");
            return None;
        };
        let weak: Weak<Shared<F>> = Arc::downgrade(&self.shared);

        Some(handle.spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(shared) = weak.upgrade() else { break };
                if shared.is_disposed() {
                    break;
                }
                shared.trim();
            }
            trace!("trimmer stopped");
        }))
    }
}

impl<F: ObjectFactory> Pool for ResourceLimitingPool<F> {
    type Factory = F;

    fn get(&self) -> PoolResult<Pooled<F>> {
        self.shared.acquire(true)
    }

    fn try_get(&self) -> Option<Pooled<F>> {
        self.shared.acquire(false).ok()
    }

    fn put(&self, object: Pooled<F>) {
        if !Arc::ptr_eq(&object.shared, &self.shared) {
            warn!(id = object.id, "ignoring put of an object this pool did not issue");
        }
        drop(object);
    }

    fn size(&self) -> usize {
        self.shared.counts().0
    }

    fn ready_size(&self) -> usize {
        self.shared.counts().1
    }

    fn dispose(&self) {
        self.shared.dispose();
    }
}

impl<F: ObjectFactory> Drop for ResourceLimitingPool<F> {
    fn drop(&mut self) {
        self.shared.dispose();
    }
}

impl<F: ObjectFactory> fmt::Debug for ResourceLimitingPool<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (size, ready) = self.shared.counts();
        f.debug_struct("ResourceLimitingPool")
            .field("size", &size)
            .field("ready_size", &ready)
            .field("config", &self.shared.config)
            .finish()
    }
}
