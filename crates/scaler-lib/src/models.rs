//! Core data models for the scaler

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Statistic of a data point selected by a query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Aggregation {
    Average,
    Total,
    Maximum,
    Minimum,
    Count,
}

impl Aggregation {
    pub const ALL: [Aggregation; 5] = [
        Aggregation::Average,
        Aggregation::Total,
        Aggregation::Maximum,
        Aggregation::Minimum,
        Aggregation::Count,
    ];

    /// Name as understood by the monitoring API
    pub fn as_str(&self) -> &'static str {
        match self {
            Aggregation::Average => "Average",
            Aggregation::Total => "Total",
            Aggregation::Maximum => "Maximum",
            Aggregation::Minimum => "Minimum",
            Aggregation::Count => "Count",
        }
    }
}

impl fmt::Display for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string names none of the five aggregation modes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownAggregation(pub String);

impl fmt::Display for UnknownAggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unsupported aggregation type {}", self.0.to_uppercase())
    }
}

impl std::error::Error for UnknownAggregation {}

impl FromStr for Aggregation {
    type Err = UnknownAggregation;

    /// Case-insensitive: `"AVERAGE"`, `"average"` and `"Average"` are equal
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Aggregation::ALL
            .into_iter()
            .find(|a| a.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownAggregation(s.to_string()))
    }
}

/// A component of an `H:M:S` aggregation interval
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntervalComponent {
    Hours,
    Minutes,
    Seconds,
}

impl fmt::Display for IntervalComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntervalComponent::Hours => f.write_str("hours"),
            IntervalComponent::Minutes => f.write_str("minutes"),
            IntervalComponent::Seconds => f.write_str("seconds"),
        }
    }
}

/// Declarative description of the metric that drives scaling.
///
/// Aliases accept the metadata keys used by scaler trigger definitions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricSourceConfig {
    /// Metric name, e.g. `Length`
    #[serde(default, alias = "name", alias = "metricName")]
    pub metric_name: String,

    #[serde(default, alias = "subscriptionID", alias = "subscriptionId")]
    pub subscription_id: String,

    #[serde(default, alias = "resourceGroupName")]
    pub resource_group_name: String,

    /// `<namespace>/<type>/<name>`, e.g. `Microsoft.Storage/queueServices/q1`
    #[serde(default, alias = "resourceURI")]
    pub resource_uri: String,

    /// One of Average, Total, Maximum, Minimum, Count (any case)
    #[serde(default, alias = "aggregationType", alias = "metricAggregationType")]
    pub aggregation_type: String,

    /// Optional `H:M:S` window, defaults to five minutes
    #[serde(
        default,
        alias = "aggregationInterval",
        alias = "metricAggregationInterval"
    )]
    pub aggregation_interval: Option<String>,

    #[serde(default, alias = "metricFilter")]
    pub filter: Option<String>,
}

/// Service principal credentials handed to the authorization provider.
///
/// The query pipeline never reads these.
#[derive(Clone, Default, Deserialize)]
pub struct CredentialsConfig {
    #[serde(default, alias = "clientID", alias = "activeDirectoryClientId")]
    pub client_id: String,

    #[serde(default, alias = "clientPassword", alias = "activeDirectoryClientPassword")]
    pub client_password: String,

    #[serde(default, alias = "tenantID", alias = "tenantId")]
    pub tenant_id: String,

    /// Token authority, defaults to the public cloud login endpoint
    #[serde(default)]
    pub authority_host: Option<String>,
}

impl fmt::Debug for CredentialsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialsConfig")
            .field("client_id", &self.client_id)
            .field("client_password", &"<redacted>")
            .field("tenant_id", &self.tenant_id)
            .field("authority_host", &self.authority_host)
            .finish()
    }
}
