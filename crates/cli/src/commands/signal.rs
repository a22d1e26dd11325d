//! Commands talking to a running metric-scaler service

use anyhow::Result;
use colored::Colorize;
use tabled::Tabled;

use crate::client::{ApiClient, HealthStatus, Signal};
use crate::output::{color_status, print_json, print_success, print_warning, OutputFormat};

/// Row for the component health table
#[derive(Tabled)]
struct ComponentRow {
    #[tabled(rename = "Component")]
    name: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Message")]
    message: String,
}

/// Fetch and print the current scaling signal
pub async fn show_signal(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let signal: Signal = client.get("api/v1/signal").await?;

    match format {
        OutputFormat::Json => print_json(&signal)?,
        OutputFormat::Table => {
            println!("{}", "Scaling Signal".bold());
            println!("{}", "=".repeat(50));
            println!("Metric:       {}", signal.metric.cyan());
            println!("Aggregation:  {}", signal.aggregation);
            println!("Resource:     {}", signal.resource_uri);
            println!("Timespan:     {}", signal.timespan);
            println!("Raw Value:    {}", signal.raw_value);
            println!();
            print_success(&format!("Signal: {}", signal.value.to_string().bold()));
        }
    }

    Ok(())
}

/// Fetch and print service health
pub async fn show_health(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let health: HealthStatus = client.health().await?;

    match format {
        OutputFormat::Json => print_json(&health)?,
        OutputFormat::Table => {
            println!("Overall: {}", color_status(health.status));

            if health.components.is_empty() {
                print_warning("No components registered");
                return Ok(());
            }

            let rows: Vec<ComponentRow> = health
                .components
                .iter()
                .map(|(name, component)| ComponentRow {
                    name: name.clone(),
                    status: color_status(component.status),
                    message: component.message.clone().unwrap_or_default(),
                })
                .collect();

            let table = tabled::Table::new(rows)
                .with(tabled::settings::Style::rounded())
                .to_string();
            println!("{}", table);
        }
    }

    Ok(())
}
