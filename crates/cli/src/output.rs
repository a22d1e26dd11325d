//! Output formatting utilities

use clap::ValueEnum;
use colored::Colorize;
use scaler_lib::ComponentStatus;
use serde::Serialize;

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

impl OutputFormat {
    /// Parse a format name from the config file
    pub fn from_config(name: &str) -> Option<Self> {
        <Self as ValueEnum>::from_str(name, true).ok()
    }
}

/// Print a value as pretty JSON
pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

/// Color a component status
pub fn color_status(status: ComponentStatus) -> String {
    match status {
        ComponentStatus::Healthy => "healthy".green().to_string(),
        ComponentStatus::Degraded => "degraded".yellow().to_string(),
        ComponentStatus::Unhealthy => "unhealthy".red().to_string(),
    }
}

/// Format a window length as `1h30m`, `5m`, `45s`
pub fn format_window(window: chrono::Duration) -> String {
    let total = window.num_seconds();
    let (hours, minutes, seconds) = (total / 3600, (total % 3600) / 60, total % 60);

    let mut out = String::new();
    if hours > 0 {
        out.push_str(&format!("{}h", hours));
    }
    if minutes > 0 {
        out.push_str(&format!("{}m", minutes));
    }
    if seconds > 0 || out.is_empty() {
        out.push_str(&format!("{}s", seconds));
    }
    out
}
