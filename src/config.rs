//! Pool configuration options

use std::time::Duration;

#[cfg(feature = "metrics")]
use serde::{Deserialize, Serialize};

/// Configuration for resource limiting pool behavior
///
/// # Examples
///
/// ```
/// use limiting_pool::PoolConfiguration;
/// use std::time::Duration;
///
/// let config = PoolConfiguration::new()
///     .with_max(10)
///     .with_max_strict(true)
///     .with_blocking(true)
///     .with_block_timeout(Duration::from_secs(5))
///     .with_trim_interval(Duration::from_secs(60));
///
/// assert_eq!(config.max, 10);
/// assert_eq!(config.block_timeout, Some(Duration::from_secs(5)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "metrics", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "metrics", serde(default))]
pub struct PoolConfiguration {
    /// Number of instances created up front by `prefill`/`initialize`
    pub min: usize,

    /// Maximum number of instances; 0 means unbounded
    pub max: usize,

    /// Whether `max` is a hard cap
    pub max_strict: bool,

    /// Whether a strict pool at capacity makes callers wait
    pub blocking: bool,

    /// How long a blocked caller waits; `None` waits indefinitely
    pub block_timeout: Option<Duration>,

    /// How often idle instances are trimmed; `None` disables trimming
    pub trim_interval: Option<Duration>,

    /// Retry interval for async checkout
    pub poll_interval: Duration,
}

impl Default for PoolConfiguration {
    fn default() -> Self {
        Self {
            min: 0,
            max: 0,
            max_strict: false,
            blocking: false,
            block_timeout: None,
            trim_interval: None,
            poll_interval: Duration::from_millis(10),
        }
    }
}

impl PoolConfiguration {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a configuration from the classic parameter list, with
    /// timeouts in milliseconds. Zero timeouts mean "wait forever" and
    /// "never trim" respectively.
    ///
    /// ```
    /// use limiting_pool::PoolConfiguration;
    ///
    /// let config = PoolConfiguration::from_millis(3, true, true, 0, 0);
    /// assert_eq!(config.block_timeout, None);
    /// assert_eq!(config.trim_interval, None);
    /// ```
    pub fn from_millis(
        max: usize,
        max_strict: bool,
        blocking: bool,
        block_timeout_ms: u64,
        trim_interval_ms: u64,
    ) -> Self {
        Self {
            max,
            max_strict,
            blocking,
            block_timeout: non_zero_millis(block_timeout_ms),
            trim_interval: non_zero_millis(trim_interval_ms),
            ..Self::default()
        }
    }

    /// Soft limit: grows past `max` under contention, trimming shrinks it back
    pub fn soft(min: usize, max: usize) -> Self {
        Self::new().with_min(min).with_max(max).with_max_strict(false)
    }

    /// Hard limit: never exceeds `max`, excess requests fail immediately
    pub fn hard(min: usize, max: usize) -> Self {
        Self::new()
            .with_min(min)
            .with_max(max)
            .with_max_strict(true)
            .with_blocking(false)
    }

    pub fn with_min(mut self, min: usize) -> Self {
        self.min = min;
        self
    }

    /// Set the maximum pool size
    pub fn with_max(mut self, max: usize) -> Self {
        self.max = max;
        self
    }

    pub fn with_max_strict(mut self, strict: bool) -> Self {
        self.max_strict = strict;
        self
    }

    pub fn with_blocking(mut self, blocking: bool) -> Self {
        self.blocking = blocking;
        self
    }

    /// Set how long a blocked `get` waits before failing
    pub fn with_block_timeout(mut self, timeout: Duration) -> Self {
        self.block_timeout = Some(timeout);
        self
    }

    /// Enable idle trimming
    pub fn with_trim_interval(mut self, interval: Duration) -> Self {
        self.trim_interval = Some(interval);
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Whether the pool has an upper bound at all
    pub fn is_bounded(&self) -> bool {
        self.max > 0
    }

    /// `min` clamped so a bounded pool never pre-fills beyond `max`
    pub(crate) fn effective_min(&self) -> usize {
        if self.is_bounded() && self.min > self.max {
            tracing::warn!(
                min = self.min,
                max = self.max,
                "configured min exceeds max, clamping"
            );
            self.max
        } else {
            self.min
        }
    }
}

fn non_zero_millis(ms: u64) -> Option<Duration> {
    (ms > 0).then(|| Duration::from_millis(ms))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_unbounded() {
        let config = PoolConfiguration::default();
        assert!(!config.is_bounded());
        assert!(!config.max_strict);
        assert_eq!(config.block_timeout, None);
    }

    #[test]
    fn test_from_millis() {
        let config = PoolConfiguration::from_millis(3, true, true, 5000, 250);
        assert_eq!(config.max, 3);
        assert!(config.max_strict);
        assert!(config.blocking);
        assert_eq!(config.block_timeout, Some(Duration::from_secs(5)));
        assert_eq!(config.trim_interval, Some(Duration::from_millis(250)));
    }

    #[test]
    fn test_presets() {
        let soft = PoolConfiguration::soft(2, 10);
        assert!(!soft.max_strict);
        assert_eq!(soft.min, 2);

        let hard = PoolConfiguration::hard(2, 10);
        assert!(hard.max_strict);
        assert!(!hard.blocking);
    }

    #[test]
    fn test_min_clamped_to_max() {
        assert_eq!(PoolConfiguration::hard(5, 3).effective_min(), 3);
        assert_eq!(PoolConfiguration::soft(5, 0).effective_min(), 5);
    }

    #[cfg(feature = "metrics")]
    #[test]
    fn test_deserialize_partial_config() {
        let config: PoolConfiguration =
            serde_json::from_str(r#"{ "max": 10, "max_strict": true, "blocking": true }"#).unwrap();
        assert_eq!(config.max, 10);
        assert!(config.blocking);
        assert_eq!(config.poll_interval, Duration::from_millis(10));
    }
}
