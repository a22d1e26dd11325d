//! Metric Scaler - Azure Monitor backed scaling signal service
//!
//! This binary serves the current scaling signal for one configured
//! metric, computed on demand from Azure Monitor.

use anyhow::{Context, Result};
use scaler_lib::{
    azure::{AzureMonitorClient, ClientSecretCredential, CredentialProvider, StaticTokenCredential},
    health::{components, HealthRegistry},
    observability::{ScalerMetrics, StructuredLogger},
    MetricScaler,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod api;
mod config;

const SCALER_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting metric-scaler");

    let config = config::ScalerConfig::load()?;
    info!(
        name = %config.name,
        metric = %config.metric.metric_name,
        aggregation = %config.metric.aggregation_type,
        "Scaler configured"
    );

    let health_registry = HealthRegistry::new();
    health_registry.register(components::QUERY_CLIENT).await;
    health_registry.register(components::CREDENTIALS).await;

    let metrics = ScalerMetrics::new();
    let logger = StructuredLogger::new(&config.name);
    logger.log_startup(SCALER_VERSION, &config.metric.resource_uri);

    // One HTTP client and one credential for the lifetime of the process
    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .build()
        .context("Failed to create HTTP client")?;

    let credentials: Arc<dyn CredentialProvider> = match &config.access_token {
        Some(token) => Arc::new(StaticTokenCredential::new(token.clone())),
        None => Arc::new(
            ClientSecretCredential::new(&config.credentials, http.clone())
                .context("Invalid credentials configuration")?,
        ),
    };

    let client = AzureMonitorClient::builder(credentials)
        .endpoint(config.management_endpoint.clone())
        .api_version(config.api_version.clone())
        .http_client(http)
        .build()
        .context("Failed to create monitoring client")?;

    let scaler = MetricScaler::new(Arc::new(client), Arc::new(logger.clone()))
        .with_metrics(metrics);

    let app_state = Arc::new(api::AppState::new(
        health_registry.clone(),
        scaler,
        config.metric.clone(),
    ));

    health_registry.set_ready(true).await;

    let api_handle = tokio::spawn(api::serve(config.api_port, app_state));

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result?;
            logger.log_shutdown("SIGINT received");
        }
        result = api_handle => {
            match result {
                Ok(Ok(())) => logger.log_shutdown("API server stopped"),
                Ok(Err(e)) => {
                    error!(error = %e, "API server failed");
                    return Err(e);
                }
                Err(e) => return Err(e).context("API server task panicked"),
            }
        }
    }

    info!("Shutting down");
    Ok(())
}
