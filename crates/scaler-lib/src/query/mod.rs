//! Metric query construction and validation
//!
//! Turns a [`MetricSourceConfig`] into an immutable [`MetricQuerySpec`]
//! ready to be handed to a [`MetricsQuerier`](crate::azure::MetricsQuerier).

mod resource;
mod timespan;

pub use resource::ResourceId;
pub use timespan::{parse_interval, Timespan, DEFAULT_WINDOW};

use crate::error::{Result, ScalerError};
use crate::models::{Aggregation, MetricSourceConfig};
use chrono::{DateTime, Utc};

/// A fully built metric query, valid for a single poll
#[derive(Debug, Clone, PartialEq)]
pub struct MetricQuerySpec {
    pub metric_name: String,
    pub subscription_id: String,
    pub resource_group: String,
    pub resource: ResourceId,
    pub aggregation: Aggregation,
    pub timespan: Timespan,
    pub filter: Option<String>,
}

impl MetricQuerySpec {
    /// Build a query spec with a window ending now
    pub fn build(config: &MetricSourceConfig) -> Result<Self> {
        Self::build_at(config, Utc::now())
    }

    /// Build a query spec with a window ending at `now`
    pub fn build_at(config: &MetricSourceConfig, now: DateTime<Utc>) -> Result<Self> {
        let resource = ResourceId::parse(&config.resource_uri)?;
        let timespan = Timespan::ending_at(config.aggregation_interval.as_deref(), now)?;

        // Missing required fields take precedence over an unknown aggregation
        check_required(
            &config.metric_name,
            &config.resource_group_name,
            &config.subscription_id,
        )?;

        let aggregation = config.aggregation_type.parse::<Aggregation>().map_err(|_| {
            ScalerError::UnsupportedAggregationType {
                namespace: resource.namespace.clone(),
                metric: config.metric_name.clone(),
                aggregation: config.aggregation_type.to_uppercase(),
            }
        })?;

        Ok(Self {
            metric_name: config.metric_name.clone(),
            subscription_id: config.subscription_id.clone(),
            resource_group: config.resource_group_name.clone(),
            resource,
            aggregation,
            timespan,
            filter: config.filter.clone().filter(|f| !f.is_empty()),
        })
    }

    /// Check required fields, reporting the first one missing.
    ///
    /// Must pass before any network call is made.
    pub fn validate(&self) -> Result<()> {
        check_required(&self.metric_name, &self.resource_group, &self.subscription_id)
    }

    /// Fully qualified resource URI
    pub fn resource_uri(&self) -> String {
        format!(
            "/subscriptions/{}/resourceGroups/{}/providers/{}/{}/{}",
            self.subscription_id,
            self.resource_group,
            self.resource.namespace,
            self.resource.resource_type,
            self.resource.name
        )
    }
}

fn check_required(metric_name: &str, resource_group: &str, subscription_id: &str) -> Result<()> {
    if metric_name.is_empty() {
        return Err(ScalerError::Validation {
            field: "metricName",
            hint: None,
        });
    }
    if resource_group.is_empty() {
        return Err(ScalerError::Validation {
            field: "resourceGroup",
            hint: None,
        });
    }
    if subscription_id.is_empty() {
        return Err(ScalerError::Validation {
            field: "subscriptionID",
            hint: Some("set a default or pass via label selectors"),
        });
    }
    Ok(())
}
