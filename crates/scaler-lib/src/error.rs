//! Error types for building, issuing and reducing metric queries

use crate::models::IntervalComponent;
use thiserror::Error;

/// Result type for scaler operations
pub type Result<T> = std::result::Result<T, ScalerError>;

/// Errors surfaced by the signal pipeline.
///
/// Every variant carries enough context (metric, resource, aggregation)
/// to diagnose a failed poll without re-querying.
#[derive(Debug, Error)]
pub enum ScalerError {
    /// Resource identifier did not split into namespace/type/name
    #[error("malformed resource identifier {resource_uri:?}: expected <namespace>/<type>/<name>, got {segments} segment(s)")]
    MalformedResourceIdentifier {
        resource_uri: String,
        segments: usize,
    },

    /// One or more components of the `H:M:S` aggregation interval were invalid
    #[error("error parsing metricAggregationInterval {interval:?}: {reason}")]
    TimespanParse {
        interval: String,
        failed: Vec<IntervalComponent>,
        reason: String,
    },

    /// A required query field was empty
    #[error("{field} is required{}", .hint.map(|h| format!(". {h}")).unwrap_or_default())]
    Validation {
        field: &'static str,
        hint: Option<&'static str>,
    },

    /// The monitoring API call failed
    #[error("error getting azure monitor metric {metric}: {source}")]
    Query {
        metric: String,
        #[source]
        source: QueryClientError,
    },

    /// The response carried no metric results at all
    #[error("got an empty response for metric {namespace}/{metric} and aggregate type {aggregation}")]
    EmptyMetricResponse {
        namespace: String,
        metric: String,
        aggregation: String,
    },

    /// The first metric result had no time series
    #[error("got metric result for {namespace}/{metric} and aggregate type {aggregation} without timeseries")]
    NoTimeseries {
        namespace: String,
        metric: String,
        aggregation: String,
    },

    /// The first time series had no data points
    #[error("got metric result for {namespace}/{metric} and aggregate type {aggregation} without any metric values")]
    NoDataPoints {
        namespace: String,
        metric: String,
        aggregation: String,
    },

    /// The configured aggregation names none of the supported modes
    #[error("unsupported aggregation type {aggregation} for metric {namespace}/{metric}")]
    UnsupportedAggregationType {
        namespace: String,
        metric: String,
        aggregation: String,
    },

    /// The latest data point lacks the requested aggregation
    #[error("unable to get value for metric {namespace}/{metric} with aggregation {aggregation}: no value returned by azure monitor")]
    UnsupportedOrMissingAggregation {
        namespace: String,
        metric: String,
        aggregation: String,
    },

    /// The rounded value does not fit in the 32-bit signal
    #[error("metric {metric} value {value} does not fit in a 32-bit scaling signal")]
    SignalOutOfRange { metric: String, value: f64 },
}

impl ScalerError {
    /// Stable snake_case label used for metrics and structured logs
    pub fn kind(&self) -> &'static str {
        match self {
            ScalerError::MalformedResourceIdentifier { .. } => "malformed_resource_identifier",
            ScalerError::TimespanParse { .. } => "timespan_parse",
            ScalerError::Validation { .. } => "validation",
            ScalerError::Query { .. } => "query",
            ScalerError::EmptyMetricResponse { .. } => "empty_metric_response",
            ScalerError::NoTimeseries { .. } => "no_timeseries",
            ScalerError::NoDataPoints { .. } => "no_data_points",
            ScalerError::UnsupportedAggregationType { .. } => "unsupported_aggregation_type",
            ScalerError::UnsupportedOrMissingAggregation { .. } => {
                "unsupported_or_missing_aggregation"
            }
            ScalerError::SignalOutOfRange { .. } => "signal_out_of_range",
        }
    }

    /// Returns true if the error was caused by the local configuration
    /// rather than by the monitoring service or its response
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            ScalerError::MalformedResourceIdentifier { .. }
                | ScalerError::TimespanParse { .. }
                | ScalerError::Validation { .. }
                | ScalerError::UnsupportedAggregationType { .. }
        )
    }
}

/// Errors raised by the monitoring API collaborator
#[derive(Debug, Error)]
pub enum QueryClientError {
    /// Connection, TLS or timeout failure
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The API answered with a non-success status
    #[error("monitoring API returned {status}: {body}")]
    Status { status: u16, body: String },

    /// No access token could be obtained
    #[error("authorization failed: {0}")]
    Authorization(String),

    /// The response body was not a valid metrics payload
    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The request URL could not be built
    #[error("invalid request url: {0}")]
    InvalidUrl(#[from] url::ParseError),
}
