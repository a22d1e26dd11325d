//! Reduction of a metrics response to a single value
//!
//! Only the most recent data point of the first time series of the first
//! metric is consulted. Earlier points in the window are ignored: the
//! signal is the latest sample, not an aggregate over the window.

use crate::error::{Result, ScalerError};
use crate::models::Aggregation;
use crate::query::MetricQuerySpec;
use crate::response::{DataPoint, MetricResponse};

/// Select the value for the requested aggregation from the latest data point
pub fn extract_value(spec: &MetricQuerySpec, response: &MetricResponse) -> Result<f64> {
    let context = ErrorContext { spec };

    let metric = response
        .value
        .as_deref()
        .and_then(|metrics| metrics.first())
        .ok_or_else(|| ScalerError::EmptyMetricResponse {
            namespace: context.namespace(),
            metric: context.metric(),
            aggregation: context.aggregation(),
        })?;

    let series = metric
        .timeseries
        .as_deref()
        .and_then(|series| series.first())
        .ok_or_else(|| ScalerError::NoTimeseries {
            namespace: context.namespace(),
            metric: context.metric(),
            aggregation: context.aggregation(),
        })?;

    let latest = series
        .data
        .as_deref()
        .and_then(|points| points.last())
        .ok_or_else(|| ScalerError::NoDataPoints {
            namespace: context.namespace(),
            metric: context.metric(),
            aggregation: context.aggregation(),
        })?;

    aggregation_value(latest, spec.aggregation).ok_or_else(|| {
        ScalerError::UnsupportedOrMissingAggregation {
            namespace: context.namespace(),
            metric: context.metric(),
            aggregation: context.aggregation(),
        }
    })
}

/// Value of a single aggregation field, if the data point carries it
pub fn aggregation_value(point: &DataPoint, aggregation: Aggregation) -> Option<f64> {
    match aggregation {
        Aggregation::Average => point.average,
        Aggregation::Total => point.total,
        Aggregation::Maximum => point.maximum,
        Aggregation::Minimum => point.minimum,
        Aggregation::Count => point.count.map(|c| c as f64),
    }
}

struct ErrorContext<'a> {
    spec: &'a MetricQuerySpec,
}

impl ErrorContext<'_> {
    fn namespace(&self) -> String {
        self.spec.resource.namespace.clone()
    }

    fn metric(&self) -> String {
        self.spec.metric_name.clone()
    }

    fn aggregation(&self) -> String {
        self.spec.aggregation.to_string()
    }
}
