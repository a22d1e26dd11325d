//! Observability infrastructure for the scaler
//!
//! Provides:
//! - Prometheus metrics (query latency, query and error counts, last signal)
//! - The [`ScalerEvents`] hook the pipeline reports through, with a
//!   structured JSON logging implementation built on tracing

use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, register_int_gauge_vec,
    Histogram, IntCounter, IntCounterVec, IntGaugeVec,
};
use std::sync::OnceLock;
use tracing::{debug, info, warn};

/// Histogram buckets for monitoring API round trips (in seconds)
const QUERY_LATENCY_BUCKETS: &[f64] = &[0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<ScalerMetricsInner> = OnceLock::new();

struct ScalerMetricsInner {
    query_latency_seconds: Histogram,
    queries_total: IntCounter,
    errors_total: IntCounterVec,
    last_signal: IntGaugeVec,
}

impl ScalerMetricsInner {
    fn new() -> Self {
        Self {
            query_latency_seconds: register_histogram!(
                "metric_scaler_query_latency_seconds",
                "Time spent waiting on the monitoring API",
                QUERY_LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register query_latency_seconds"),

            queries_total: register_int_counter!(
                "metric_scaler_queries_total",
                "Total number of signal computations attempted"
            )
            .expect("Failed to register queries_total"),

            errors_total: register_int_counter_vec!(
                "metric_scaler_errors_total",
                "Total number of failed signal computations by error kind",
                &["kind"]
            )
            .expect("Failed to register errors_total"),

            last_signal: register_int_gauge_vec!(
                "metric_scaler_last_signal",
                "Most recently computed scaling signal",
                &["metric", "aggregation"]
            )
            .expect("Failed to register last_signal"),
        }
    }
}

/// Scaler metrics for Prometheus exposition
///
/// Lightweight handle to the global metrics instance; clones share the
/// same underlying collectors.
#[derive(Clone)]
pub struct ScalerMetrics {
    _private: (),
}

impl Default for ScalerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ScalerMetrics {
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(ScalerMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &ScalerMetricsInner {
        GLOBAL_METRICS.get_or_init(ScalerMetricsInner::new)
    }

    pub fn observe_query_latency(&self, duration_secs: f64) {
        self.inner().query_latency_seconds.observe(duration_secs);
    }

    pub fn inc_queries(&self) {
        self.inner().queries_total.inc();
    }

    pub fn inc_errors(&self, kind: &str) {
        self.inner().errors_total.with_label_values(&[kind]).inc();
    }

    pub fn set_last_signal(&self, metric: &str, aggregation: &str, value: i32) {
        self.inner()
            .last_signal
            .with_label_values(&[metric, aggregation])
            .set(i64::from(value));
    }
}

/// Hooks the signal pipeline reports through.
///
/// Injected so the pipeline can be exercised without log side effects.
pub trait ScalerEvents: Send + Sync {
    /// The fully qualified resource URI about to be queried
    fn resource_uri(&self, resource_uri: &str);

    /// The raw value extracted from the response
    fn metric_value(&self, metric: &str, aggregation: &str, value: f64);

    /// The final rounded signal
    fn signal(&self, metric: &str, aggregation: &str, value: i32);

    /// A poll failed
    fn query_failed(&self, metric: &str, kind: &str, error: &str);
}

/// Discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEvents;

impl ScalerEvents for NoopEvents {
    fn resource_uri(&self, _resource_uri: &str) {}
    fn metric_value(&self, _metric: &str, _aggregation: &str, _value: f64) {}
    fn signal(&self, _metric: &str, _aggregation: &str, _value: i32) {}
    fn query_failed(&self, _metric: &str, _kind: &str, _error: &str) {}
}

/// Structured logger for scaler events
///
/// Emits consistent JSON-formatted records keyed by `event`.
#[derive(Clone)]
pub struct StructuredLogger {
    scaler_name: String,
}

impl StructuredLogger {
    pub fn new(scaler_name: impl Into<String>) -> Self {
        Self {
            scaler_name: scaler_name.into(),
        }
    }

    /// Log scaler startup
    pub fn log_startup(&self, version: &str, resource_uri: &str) {
        info!(
            event = "scaler_started",
            scaler = %self.scaler_name,
            scaler_version = %version,
            resource_uri = %resource_uri,
            "Metric scaler started"
        );
    }

    /// Log scaler shutdown
    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "scaler_shutdown",
            scaler = %self.scaler_name,
            reason = %reason,
            "Metric scaler shutting down"
        );
    }
}

impl ScalerEvents for StructuredLogger {
    fn resource_uri(&self, resource_uri: &str) {
        debug!(
            event = "metric_query",
            scaler = %self.scaler_name,
            resource_uri = %resource_uri,
            "Querying monitoring API"
        );
    }

    fn metric_value(&self, metric: &str, aggregation: &str, value: f64) {
        debug!(
            event = "metric_value",
            scaler = %self.scaler_name,
            metric = %metric,
            aggregation = %aggregation,
            value = value,
            "Extracted metric value"
        );
    }

    fn signal(&self, metric: &str, aggregation: &str, value: i32) {
        info!(
            event = "signal_computed",
            scaler = %self.scaler_name,
            metric = %metric,
            aggregation = %aggregation,
            signal = value,
            "Computed scaling signal"
        );
    }

    fn query_failed(&self, metric: &str, kind: &str, error: &str) {
        warn!(
            event = "signal_failed",
            scaler = %self.scaler_name,
            metric = %metric,
            kind = %kind,
            error = %error,
            "Error getting azure monitor metric"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scaler_metrics_creation() {
        // Collectors live in the global registry; creating several handles
        // must not register them twice.
        let metrics = ScalerMetrics::new();
        let other = ScalerMetrics::new();

        metrics.observe_query_latency(0.12);
        metrics.inc_queries();
        other.inc_errors("query");
        other.set_last_signal("Length", "Average", 13);

        let families = prometheus::gather();
        assert!(families
            .iter()
            .any(|f| f.get_name() == "metric_scaler_last_signal"));
    }

    #[test]
    fn test_structured_logger_creation() {
        let logger = StructuredLogger::new("queue-scaler");
        assert_eq!(logger.scaler_name, "queue-scaler");
        logger.signal("Length", "Average", 13);
    }
}
