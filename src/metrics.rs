//! Metrics collection and export for object pools

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

#[cfg(feature = "metrics")]
use serde::Serialize;

/// Point-in-time metrics for a pool
///
/// # Examples
///
/// ```
/// use limiting_pool::{DefaultObjectFactory, Pool, PoolConfiguration, ResourceLimitingPool};
///
/// let pool = ResourceLimitingPool::new(
///     DefaultObjectFactory::<u64>::new(),
///     PoolConfiguration::hard(0, 4),
/// );
///
/// {
///     let _obj = pool.get().unwrap();
///     let metrics = pool.metrics();
///     assert_eq!(metrics.total_gets, 1);
///     assert_eq!(metrics.checked_out, 1);
///     assert_eq!(metrics.total_created, 1);
/// }
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "metrics", derive(Serialize))]
pub struct PoolMetrics {
    /// Instances owned by the pool, ready or checked out
    pub size: usize,

    /// Instances waiting in the ready set
    pub ready_size: usize,

    /// Instances currently checked out
    pub checked_out: usize,

    /// Configured maximum (0 = unbounded)
    pub max: usize,

    /// Checked-out share of `max` (0.0 when unbounded)
    pub utilization: f64,

    pub total_gets: usize,
    pub total_puts: usize,
    pub total_created: usize,
    pub total_decommissioned: usize,

    /// Gets that had to wait for a free slot
    pub blocked_gets: usize,

    pub timeouts: usize,
    pub exhausted_events: usize,
    pub factory_failures: usize,
    pub validation_failures: usize,

    /// Instances removed by trimming
    pub trimmed: usize,
}

impl PoolMetrics {
    /// Export metrics as a HashMap
    pub fn export(&self) -> HashMap<String, String> {
        let mut metrics = HashMap::new();
        metrics.insert("size".to_string(), self.size.to_string());
        metrics.insert("ready_size".to_string(), self.ready_size.to_string());
        metrics.insert("checked_out".to_string(), self.checked_out.to_string());
        metrics.insert("max".to_string(), self.max.to_string());
        metrics.insert("utilization".to_string(), format!("{:.2}", self.utilization));
        metrics.insert("total_gets".to_string(), self.total_gets.to_string());
        metrics.insert("total_puts".to_string(), self.total_puts.to_string());
        metrics.insert("total_created".to_string(), self.total_created.to_string());
        metrics.insert("total_decommissioned".to_string(), self.total_decommissioned.to_string());
        metrics.insert("blocked_gets".to_string(), self.blocked_gets.to_string());
        metrics.insert("timeouts".to_string(), self.timeouts.to_string());
        metrics.insert("exhausted_events".to_string(), self.exhausted_events.to_string());
        metrics.insert("factory_failures".to_string(), self.factory_failures.to_string());
        metrics.insert("validation_failures".to_string(), self.validation_failures.to_string());
        metrics.insert("trimmed".to_string(), self.trimmed.to_string());
        metrics
    }
}

/// Metrics exporter for Prometheus format
pub struct MetricsExporter;

impl MetricsExporter {
    /// Export metrics in Prometheus exposition format
    ///
    /// # Examples
    ///
    /// ```
    /// use limiting_pool::{DefaultObjectFactory, MetricsExporter, PoolConfiguration, ResourceLimitingPool};
    /// use std::collections::HashMap;
    ///
    /// let pool = ResourceLimitingPool::new(
    ///     DefaultObjectFactory::<u64>::new(),
    ///     PoolConfiguration::soft(2, 8),
    /// );
    ///
    /// let mut tags = HashMap::new();
    /// tags.insert("service".to_string(), "api".to_string());
    ///
    /// let output = MetricsExporter::export_prometheus(&pool.metrics(), "workers", Some(&tags));
    /// assert!(output.contains("limiting_pool_size"));
    /// assert!(output.contains("service=\"api\""));
    /// ```
    pub fn export_prometheus(
        metrics: &PoolMetrics,
        pool_name: &str,
        tags: Option<&HashMap<String, String>>,
    ) -> String {
        let mut output = String::new();
        let labels = Self::format_labels(pool_name, tags);

        let gauges: [(&str, &str, String); 4] = [
            ("limiting_pool_size", "Instances owned by the pool", metrics.size.to_string()),
            ("limiting_pool_ready_size", "Instances in the ready set", metrics.ready_size.to_string()),
            ("limiting_pool_checked_out", "Instances currently checked out", metrics.checked_out.to_string()),
            ("limiting_pool_utilization", "Checked-out share of max", format!("{:.2}", metrics.utilization)),
        ];
        for (name, help, value) in gauges {
            Self::push_metric(&mut output, name, help, "gauge", &labels, &value);
        }

        let counters: [(&str, &str, usize); 10] = [
            ("limiting_pool_gets_total", "Successful gets", metrics.total_gets),
            ("limiting_pool_puts_total", "Instances returned", metrics.total_puts),
            ("limiting_pool_created_total", "Instances created by the factory", metrics.total_created),
            ("limiting_pool_decommissioned_total", "Instances decommissioned", metrics.total_decommissioned),
            ("limiting_pool_blocked_gets_total", "Gets that waited for a free slot", metrics.blocked_gets),
            ("limiting_pool_timeouts_total", "Gets that timed out", metrics.timeouts),
            ("limiting_pool_exhausted_total", "Gets rejected at capacity", metrics.exhausted_events),
            ("limiting_pool_factory_failures_total", "Factory creation failures", metrics.factory_failures),
            (
                "limiting_pool_validation_failures_total",
                "Ready instances discarded by validation",
                metrics.validation_failures,
            ),
            ("limiting_pool_trimmed_total", "Instances removed by trimming", metrics.trimmed),
        ];
        for (name, help, value) in counters {
            Self::push_metric(&mut output, name, help, "counter", &labels, &value.to_string());
        }

        output
    }

    fn push_metric(output: &mut String, name: &str, help: &str, kind: &str, labels: &str, value: &str) {
        output.push_str(&format!("# HELP {} {}\n", name, help));
        output.push_str(&format!("# TYPE {} {}\n", name, kind));
        output.push_str(&format!("{}{{{}}} {}\n", name, labels, value));
    }

    fn format_labels(pool_name: &str, tags: Option<&HashMap<String, String>>) -> String {
        let mut labels = vec![format!("pool=\"{}\"", pool_name)];

        if let Some(tags) = tags {
            let mut sorted: Vec<_> = tags.iter().collect();
            sorted.sort();
            for (key, value) in sorted {
                labels.push(format!("{}=\"{}\"", key, value));
            }
        }

        labels.join(",")
    }
}

/// Internal counters, updated lock-free alongside the pool state
#[derive(Default)]
pub(crate) struct MetricsTracker {
    pub gets: AtomicUsize,
    pub puts: AtomicUsize,
    pub created: AtomicUsize,
    pub decommissioned: AtomicUsize,
    pub blocked: AtomicUsize,
    pub timeouts: AtomicUsize,
    pub exhausted: AtomicUsize,
    pub factory_failures: AtomicUsize,
    pub validation_failures: AtomicUsize,
    pub trimmed: AtomicUsize,
}

impl MetricsTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn incr(counter: &AtomicUsize) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add(counter: &AtomicUsize, n: usize) {
        counter.fetch_add(n, Ordering::Relaxed);
    }

    pub fn snapshot(&self, size: usize, ready_size: usize, max: usize) -> PoolMetrics {
        let checked_out = size - ready_size;
        let utilization = if max > 0 {
            checked_out as f64 / max as f64
        } else {
            0.0
        };

        PoolMetrics {
            size,
            ready_size,
            checked_out,
            max,
            utilization,
            total_gets: self.gets.load(Ordering::Relaxed),
            total_puts: self.puts.load(Ordering::Relaxed),
            total_created: self.created.load(Ordering::Relaxed),
            total_decommissioned: self.decommissioned.load(Ordering::Relaxed),
            blocked_gets: self.blocked.load(Ordering::Relaxed),
            timeouts: self.timeouts.load(Ordering::Relaxed),
            exhausted_events: self.exhausted.load(Ordering::Relaxed),
            factory_failures: self.factory_failures.load(Ordering::Relaxed),
            validation_failures: self.validation_failures.load(Ordering::Relaxed),
            trimmed: self.trimmed.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_utilization() {
        let tracker = MetricsTracker::new();
        MetricsTracker::incr(&tracker.gets);
        MetricsTracker::add(&tracker.created, 3);

        let metrics = tracker.snapshot(4, 1, 6);
        assert_eq!(metrics.checked_out, 3);
        assert!((metrics.utilization - 0.5).abs() < f64::EPSILON);
        assert_eq!(metrics.total_gets, 1);
        assert_eq!(metrics.total_created, 3);

        let unbounded = tracker.snapshot(4, 1, 0);
        assert_eq!(unbounded.utilization, 0.0);
    }

    #[test]
    fn test_export_map() {
        let metrics = MetricsTracker::new().snapshot(2, 2, 4);
        let map = metrics.export();
        assert_eq!(map["size"], "2");
        assert_eq!(map["checked_out"], "0");
        assert_eq!(map["utilization"], "0.00");
    }

    #[test]
    fn test_prometheus_labels_are_sorted() {
        let metrics = MetricsTracker::new().snapshot(0, 0, 0);
        let mut tags = HashMap::new();
        tags.insert("zone".to_string(), "b".to_string());
        tags.insert("app".to_string(), "a".to_string());

        let output = MetricsExporter::export_prometheus(&metrics, "p", Some(&tags));
        assert!(output.contains("limiting_pool_size{pool=\"p\",app=\"a\",zone=\"b\"} 0"));
        assert!(output.contains("# TYPE limiting_pool_gets_total counter"));
    }

    #[test]
    fn test_prometheus_exports_every_counter() {
        let tracker = MetricsTracker::new();
        MetricsTracker::add(&tracker.validation_failures, 2);
        let metrics = tracker.snapshot(0, 0, 0);

        let output = MetricsExporter::export_prometheus(&metrics, "p", None);
        assert!(output.contains("# TYPE limiting_pool_validation_failures_total counter"));
        assert!(output.contains("limiting_pool_validation_failures_total{pool=\"p\"} 2"));

        // every counter in the map export has a Prometheus series
        let series = output.lines().filter(|line| line.starts_with("# TYPE")).count();
        assert_eq!(series, metrics.export().len() - 1);
    }
}
