//! Metrics hooks for store operations and artificial store latency.
//!
//! # Metrics
//!
//! Implement `StoreMetrics` to forward store timings to a monitoring system:
//!
//! ```ignore
//! use catering_kit::observability::StoreMetrics;
//! use std::time::Duration;
//!
//! struct PrometheusMetrics;
//!
//! impl StoreMetrics for PrometheusMetrics {
//!     fn record_fetch(&self, kind: &str, count: usize, duration: Duration) {
//!         // histogram!("store_fetch_seconds", "kind" => kind).record(duration);
//!     }
//! }
//!
//! // let service = CateringService::with_metrics(events, invoices, menu_items,
//! //     Box::new(PrometheusMetrics));
//! ```
//!
//! Methods that are not overridden log through the `log` crate. `NoOpMetrics`
//! discards everything.
//!
//! # Latency
//!
//! The in-memory store can stand in for a hosted store during development by
//! sleeping before each operation:
//!
//! ```
//! use catering_kit::observability::LatencyPolicy;
//! use std::time::Duration;
//!
//! let _policy = LatencyPolicy::Fixed(Duration::from_millis(300));
//!
//! let _policy = LatencyPolicy::PerKind(|kind| match kind {
//!     "invoice" => Duration::from_millis(400),
//!     _ => Duration::from_millis(250),
//! });
//! ```

use std::time::Duration;

/// Trait for store metrics collection.
///
/// `kind` is an entity kind such as `"event"`; `key` is a record key such as
/// `"event:12"` (see `crate::key::RecordKeyBuilder`).
pub trait StoreMetrics: Send + Sync {
    /// Record a collection fetch.
    fn record_fetch(&self, kind: &str, count: usize, duration: Duration) {
        debug!("Store FETCH {}: {} records in {:?}", kind, count, duration);
    }

    /// Record a single-record read.
    fn record_read(&self, key: &str, duration: Duration) {
        debug!("Store READ: {} took {:?}", key, duration);
    }

    /// Record a create or update.
    fn record_write(&self, key: &str, duration: Duration) {
        debug!("Store WRITE: {} took {:?}", key, duration);
    }

    /// Record a delete.
    fn record_delete(&self, key: &str, duration: Duration) {
        debug!("Store DELETE: {} took {:?}", key, duration);
    }

    /// Record an error.
    fn record_error(&self, key: &str, error: &str) {
        warn!("Store ERROR for {}: {}", key, error);
    }
}

/// Metrics implementation that keeps the default log output.
#[derive(Clone, Default)]
pub struct LogMetrics;

impl StoreMetrics for LogMetrics {}

/// Metrics implementation that discards everything.
#[derive(Clone, Default)]
pub struct NoOpMetrics;

impl StoreMetrics for NoOpMetrics {
    fn record_fetch(&self, _kind: &str, _count: usize, _duration: Duration) {}
    fn record_read(&self, _key: &str, _duration: Duration) {}
    fn record_write(&self, _key: &str, _duration: Duration) {}
    fn record_delete(&self, _key: &str, _duration: Duration) {}
    fn record_error(&self, _key: &str, _error: &str) {}
}

/// Artificial delay applied by the in-memory store before each operation.
#[derive(Clone, Debug, Default)]
pub enum LatencyPolicy {
    /// Answer immediately
    #[default]
    None,

    /// Same delay for every kind
    Fixed(Duration),

    /// Custom per-kind delay
    PerKind(fn(&str) -> Duration),
}

impl LatencyPolicy {
    /// `None` for zero, `Fixed` otherwise.
    pub fn from_millis(ms: u64) -> Self {
        if ms == 0 {
            LatencyPolicy::None
        } else {
            LatencyPolicy::Fixed(Duration::from_millis(ms))
        }
    }

    /// Delay for an entity kind, if any.
    pub fn delay_for(&self, kind: &str) -> Option<Duration> {
        match self {
            LatencyPolicy::None => None,
            LatencyPolicy::Fixed(d) => Some(*d),
            LatencyPolicy::PerKind(f) => Some(f(kind)),
        }
        .filter(|d| !d.is_zero())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noop_metrics() {
        let metrics = NoOpMetrics;
        metrics.record_fetch("event", 3, Duration::from_millis(1));
        metrics.record_error("event:1", "boom");
    }

    #[test]
    fn test_latency_policy_none() {
        assert_eq!(LatencyPolicy::None.delay_for("event"), None);
        assert!(matches!(LatencyPolicy::from_millis(0), LatencyPolicy::None));
    }

    #[test]
    fn test_latency_policy_fixed() {
        let policy = LatencyPolicy::from_millis(300);
        assert_eq!(policy.delay_for("invoice"), Some(Duration::from_millis(300)));
    }

    #[test]
    fn test_latency_policy_per_kind() {
        let policy = LatencyPolicy::PerKind(|kind| match kind {
            "invoice" => Duration::from_millis(400),
            "event" => Duration::ZERO,
            _ => Duration::from_millis(250),
        });

        assert_eq!(policy.delay_for("invoice"), Some(Duration::from_millis(400)));
        assert_eq!(policy.delay_for("menu_item"), Some(Duration::from_millis(250)));
        assert_eq!(policy.delay_for("event"), None);
    }
}
