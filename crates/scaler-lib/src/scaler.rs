//! Signal pipeline
//!
//! Each evaluation is one synchronous sequence: build → validate → query →
//! extract → round. Nothing is cached between evaluations and failures are
//! returned immediately; the caller retries on its own polling cadence.

use crate::azure::{MetricsQuerier, MetricsRequest};
use crate::error::{Result, ScalerError};
use crate::extract::extract_value;
use crate::models::{Aggregation, MetricSourceConfig};
use crate::observability::{ScalerEvents, ScalerMetrics};
use crate::query::MetricQuerySpec;
use crate::signal::round_signal;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

/// Outcome of a successful evaluation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalReport {
    pub metric: String,
    pub aggregation: Aggregation,
    pub resource_uri: String,
    pub timespan: String,
    /// Raw value before rounding
    pub raw_value: f64,
    /// Rounded scaling signal
    pub value: i32,
}

/// Computes scaling signals through an injected metrics querier
#[derive(Clone)]
pub struct MetricScaler {
    querier: Arc<dyn MetricsQuerier>,
    events: Arc<dyn ScalerEvents>,
    metrics: Option<ScalerMetrics>,
}

impl MetricScaler {
    pub fn new(querier: Arc<dyn MetricsQuerier>, events: Arc<dyn ScalerEvents>) -> Self {
        Self {
            querier,
            events,
            metrics: None,
        }
    }

    /// Record query latency, error and signal metrics
    pub fn with_metrics(mut self, metrics: ScalerMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// The metric value rounded to the nearest integer
    pub async fn get_metric_value(&self, config: &MetricSourceConfig) -> Result<i32> {
        self.evaluate(config).await.map(|report| report.value)
    }

    /// Run the full pipeline once
    pub async fn evaluate(&self, config: &MetricSourceConfig) -> Result<SignalReport> {
        if let Some(metrics) = &self.metrics {
            metrics.inc_queries();
        }

        let result = self.run(config).await;

        if let Err(e) = &result {
            self.events
                .query_failed(&config.metric_name, e.kind(), &e.to_string());
            if let Some(metrics) = &self.metrics {
                metrics.inc_errors(e.kind());
            }
        }

        result
    }

    async fn run(&self, config: &MetricSourceConfig) -> Result<SignalReport> {
        let spec = MetricQuerySpec::build(config)?;
        spec.validate()?;

        let request = MetricsRequest::from(&spec);
        self.events.resource_uri(&request.resource_uri);

        let start = Instant::now();
        let response = self.querier.query(&request).await;
        if let Some(metrics) = &self.metrics {
            metrics.observe_query_latency(start.elapsed().as_secs_f64());
        }
        let response = response.map_err(|source| ScalerError::Query {
            metric: spec.metric_name.clone(),
            source,
        })?;

        let raw_value = extract_value(&spec, &response)?;
        let aggregation = spec.aggregation.as_str();
        self.events
            .metric_value(&spec.metric_name, aggregation, raw_value);

        let value = round_signal(&spec.metric_name, raw_value)?;
        self.events.signal(&spec.metric_name, aggregation, value);
        if let Some(metrics) = &self.metrics {
            metrics.set_last_signal(&spec.metric_name, aggregation, value);
        }

        Ok(SignalReport {
            metric: spec.metric_name.clone(),
            aggregation: spec.aggregation,
            resource_uri: request.resource_uri,
            timespan: request.timespan,
            raw_value,
            value,
        })
    }
}
