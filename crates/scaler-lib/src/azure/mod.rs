//! Azure Monitor collaborators
//!
//! This module provides:
//! - The [`MetricsQuerier`] boundary the signal pipeline queries through
//! - A REST implementation of it over reqwest
//! - Credential providers issuing bearer tokens for the management API

mod client;
mod credentials;

pub use client::{
    AzureMonitorClient, AzureMonitorClientBuilder, DEFAULT_API_VERSION,
    DEFAULT_MANAGEMENT_ENDPOINT,
};
pub use credentials::{
    AccessToken, ClientSecretCredential, CredentialProvider, StaticTokenCredential,
    DEFAULT_AUTHORITY_HOST, MANAGEMENT_SCOPE,
};

use crate::error::QueryClientError;
use crate::models::Aggregation;
use crate::query::MetricQuerySpec;
use crate::response::MetricResponse;
use async_trait::async_trait;

/// Parameters of a single metrics query
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsRequest<'a> {
    /// `/subscriptions/{id}/resourceGroups/{group}/providers/{namespace}/{type}/{name}`
    pub resource_uri: String,
    /// `{start}/{end}`
    pub timespan: String,
    pub metric_name: &'a str,
    pub aggregation: Aggregation,
    pub filter: Option<&'a str>,
}

impl<'a> From<&'a MetricQuerySpec> for MetricsRequest<'a> {
    fn from(spec: &'a MetricQuerySpec) -> Self {
        Self {
            resource_uri: spec.resource_uri(),
            timespan: spec.timespan.to_string(),
            metric_name: &spec.metric_name,
            aggregation: spec.aggregation,
            filter: spec.filter.as_deref(),
        }
    }
}

/// Issues metric queries against the monitoring service.
///
/// Implementations own transport and authorization; they must not retry.
#[async_trait]
pub trait MetricsQuerier: Send + Sync {
    async fn query(&self, request: &MetricsRequest<'_>) -> Result<MetricResponse, QueryClientError>;
}
