//! Metric Scaler CLI
//!
//! A command-line tool for reading the current scaling signal, checking
//! service health and validating metric queries offline.

mod client;
mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{inspect, signal};

/// Metric Scaler CLI
#[derive(Parser)]
#[command(name = "msig")]
#[command(author, version, about = "CLI for the Metric Scaler", long_about = None)]
pub struct Cli {
    /// metric-scaler service URL (can also be set via MSIG_API_URL env var)
    #[arg(long, env = "MSIG_API_URL")]
    pub api_url: Option<String>,

    /// Output format
    #[arg(long, short)]
    pub format: Option<output::OutputFormat>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the current scaling signal
    Signal,

    /// Show service health
    Health,

    /// Build and validate a metric query without sending it
    Inspect {
        /// Resource identifier: <namespace>/<type>/<name>
        #[arg(long)]
        resource_uri: String,

        /// Metric name
        #[arg(long)]
        metric_name: String,

        /// Subscription ID (defaults to the config file)
        #[arg(long, env = "MSIG_SUBSCRIPTION_ID")]
        subscription_id: Option<String>,

        /// Resource group (defaults to the config file)
        #[arg(long)]
        resource_group: Option<String>,

        /// Average, Total, Maximum, Minimum or Count
        #[arg(long, default_value = "Average")]
        aggregation: String,

        /// Query window as H:M:S (defaults to 5 minutes)
        #[arg(long)]
        interval: Option<String>,

        /// Metric filter expression
        #[arg(long)]
        filter: Option<String>,
    },
}

const DEFAULT_API_URL: &str = "http://localhost:8080";

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = config::Config::load()?;

    let format = cli
        .format
        .or_else(|| {
            config
                .default_format
                .as_deref()
                .and_then(output::OutputFormat::from_config)
        })
        .unwrap_or_default();

    let api_url = cli
        .api_url
        .or_else(|| config.api_url.clone())
        .unwrap_or_else(|| DEFAULT_API_URL.to_string());

    match cli.command {
        Commands::Signal => {
            let client = client::ApiClient::new(&api_url)?;
            signal::show_signal(&client, format).await?;
        }
        Commands::Health => {
            let client = client::ApiClient::new(&api_url)?;
            signal::show_health(&client, format).await?;
        }
        Commands::Inspect {
            resource_uri,
            metric_name,
            subscription_id,
            resource_group,
            aggregation,
            interval,
            filter,
        } => {
            let args = inspect::InspectArgs {
                resource_uri,
                metric_name,
                subscription_id,
                resource_group,
                aggregation,
                interval,
                filter,
            };
            inspect::inspect(args, &config, format)?;
        }
    }

    Ok(())
}
