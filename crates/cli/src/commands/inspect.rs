//! Offline query inspection
//!
//! Builds and validates the query exactly as the scaler would, without
//! contacting the monitoring service.

use anyhow::{Context, Result};
use colored::Colorize;
use scaler_lib::query::MetricQuerySpec;
use scaler_lib::MetricSourceConfig;
use serde::Serialize;

use crate::config::Config;
use crate::output::{format_window, print_json, print_success, OutputFormat};

/// Query parameters given on the command line
#[derive(Debug, Clone, Default)]
pub struct InspectArgs {
    pub resource_uri: String,
    pub metric_name: String,
    pub subscription_id: Option<String>,
    pub resource_group: Option<String>,
    pub aggregation: String,
    pub interval: Option<String>,
    pub filter: Option<String>,
}

/// The query the scaler would issue
#[derive(Debug, Clone, Serialize)]
pub struct QueryPlan {
    pub resource_uri: String,
    pub metric: String,
    pub aggregation: String,
    pub timespan: String,
    pub window: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
}

/// Build and validate a query, filling gaps from the config file defaults
pub fn plan_query(args: InspectArgs, config: &Config) -> Result<QueryPlan> {
    let source = MetricSourceConfig {
        metric_name: args.metric_name,
        subscription_id: args
            .subscription_id
            .or_else(|| config.default_subscription_id.clone())
            .unwrap_or_default(),
        resource_group_name: args
            .resource_group
            .or_else(|| config.default_resource_group.clone())
            .unwrap_or_default(),
        resource_uri: args.resource_uri,
        aggregation_type: args.aggregation,
        aggregation_interval: args.interval,
        filter: args.filter,
    };

    let spec = MetricQuerySpec::build(&source).context("Failed to build query")?;
    spec.validate().context("Invalid query")?;

    Ok(QueryPlan {
        resource_uri: spec.resource_uri(),
        metric: spec.metric_name.clone(),
        aggregation: spec.aggregation.to_string(),
        timespan: spec.timespan.to_string(),
        window: format_window(spec.timespan.duration()),
        filter: spec.filter.clone(),
    })
}

/// Print the query the scaler would issue
pub fn inspect(args: InspectArgs, config: &Config, format: OutputFormat) -> Result<()> {
    let plan = plan_query(args, config)?;

    match format {
        OutputFormat::Json => print_json(&plan)?,
        OutputFormat::Table => {
            println!("{}", "Metric Query".bold());
            println!("{}", "=".repeat(50));
            println!("Resource:     {}", plan.resource_uri.cyan());
            println!("Metric:       {}", plan.metric);
            println!("Aggregation:  {}", plan.aggregation);
            println!("Timespan:     {} ({})", plan.timespan, plan.window);
            if let Some(filter) = &plan.filter {
                println!("Filter:       {}", filter);
            }
            println!();
            print_success("Query is valid");
        }
    }

    Ok(())
}
