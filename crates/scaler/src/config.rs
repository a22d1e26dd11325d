//! Scaler configuration

use anyhow::{Context, Result};
use scaler_lib::azure::{DEFAULT_API_VERSION, DEFAULT_MANAGEMENT_ENDPOINT};
use scaler_lib::{CredentialsConfig, MetricSourceConfig};
use serde::Deserialize;

/// Scaler configuration
///
/// Loaded from `SCALER_*` environment variables; nested sections use a
/// double underscore, e.g. `SCALER_METRIC__RESOURCE_URI`.
#[derive(Debug, Clone, Deserialize)]
pub struct ScalerConfig {
    /// Name reported in structured logs
    #[serde(default = "default_name")]
    pub name: String,

    /// API server port for signal/health/metrics
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Resource manager endpoint queried for metrics
    #[serde(default = "default_management_endpoint")]
    pub management_endpoint: String,

    /// Metrics API version
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Timeout for a single request to the monitoring API
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Pre-issued bearer token; when set, client credentials are not used
    #[serde(default)]
    pub access_token: Option<String>,

    #[serde(default)]
    pub metric: MetricSourceConfig,

    #[serde(default)]
    pub credentials: CredentialsConfig,
}

fn default_name() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| "metric-scaler".to_string())
}

fn default_api_port() -> u16 {
    8080
}

fn default_management_endpoint() -> String {
    DEFAULT_MANAGEMENT_ENDPOINT.to_string()
}

fn default_api_version() -> String {
    DEFAULT_API_VERSION.to_string()
}

fn default_request_timeout() -> u64 {
    30
}

impl ScalerConfig {
    /// Load configuration from the environment
    pub fn load() -> Result<Self> {
        Self::from_source(
            config::Environment::with_prefix("SCALER")
                .prefix_separator("_")
                .separator("__"),
        )
    }

    fn from_source<S>(source: S) -> Result<Self>
    where
        S: config::Source + Send + Sync + 'static,
    {
        config::Config::builder()
            .add_source(source)
            .build()
            .context("Failed to read scaler configuration")?
            .try_deserialize()
            .context("Invalid scaler configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_source(vars: &[(&str, &str)]) -> config::Environment {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        config::Environment::with_prefix("SCALER")
            .prefix_separator("_")
            .separator("__")
            .source(Some(vars))
    }

    #[test]
    fn test_defaults() {
        let config = ScalerConfig::from_source(env_source(&[])).unwrap();
        assert_eq!(config.api_port, 8080);
        assert_eq!(config.management_endpoint, DEFAULT_MANAGEMENT_ENDPOINT);
        assert_eq!(config.api_version, DEFAULT_API_VERSION);
        assert_eq!(config.request_timeout_secs, 30);
        assert!(config.access_token.is_none());
        assert!(config.metric.metric_name.is_empty());
    }

    #[test]
    fn test_nested_metric_and_credentials() {
        let config = ScalerConfig::from_source(env_source(&[
            ("SCALER_API_PORT", "9090"),
            ("SCALER_METRIC__METRIC_NAME", "Length"),
            ("SCALER_METRIC__SUBSCRIPTION_ID", "s1"),
            ("SCALER_METRIC__RESOURCE_GROUP_NAME", "g1"),
            ("SCALER_METRIC__RESOURCE_URI", "Microsoft.Storage/queueServices/q1"),
            ("SCALER_METRIC__AGGREGATION_TYPE", "Average"),
            ("SCALER_METRIC__AGGREGATION_INTERVAL", "0:10:0"),
            ("SCALER_CREDENTIALS__TENANT_ID", "tenant-1"),
            ("SCALER_CREDENTIALS__CLIENT_ID", "client-1"),
        ]))
        .unwrap();

        assert_eq!(config.api_port, 9090);
        assert_eq!(config.metric.metric_name, "Length");
        assert_eq!(config.metric.resource_uri, "Microsoft.Storage/queueServices/q1");
        assert_eq!(config.metric.aggregation_interval.as_deref(), Some("0:10:0"));
        assert_eq!(config.credentials.tenant_id, "tenant-1");
        assert_eq!(config.credentials.client_id, "client-1");
    }

    #[test]
    fn test_invalid_port_rejected() {
        let result = ScalerConfig::from_source(env_source(&[("SCALER_API_PORT", "not-a-port")]));
        assert!(result.is_err());
    }
}
