//! Output formatting utilities

use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Print a table from a list of items
pub fn print_table<T: Tabled + Serialize>(items: &[T], format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Table => {
            if items.is_empty() {
                println!("{}", "No items found".yellow());
                return Ok(());
            }
            let table = Table::new(items).with(Style::rounded()).to_string();
            println!("{}", table);
        }
        OutputFormat::Json => print_json(&items)?,
    }
    Ok(())
}

/// Print any serializable value as pretty JSON
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
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

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Format currency
pub fn format_currency(amount: f64) -> String {
    format!("${:.2}", amount)
}

/// Format a per-unit price with enough precision for hourly rates
pub fn format_rate(amount: f64) -> String {
    format!("${:.4}", amount)
}

/// Format a machine shape as "2 vCPU / 7.50 GB"
pub fn format_shape(vcpus: f64, memory_gb: f64) -> String {
    format!("{} vCPU / {:.2} GB", vcpus, memory_gb)
}

/// Color status based on value
pub fn color_status(status: &str) -> String {
    match status.to_lowercase().as_str() {
        "optimizable" => status.green().to_string(),
        "right-sized" | "at minimum" => status.blue().to_string(),
        "not running" | "no cost" => status.yellow().to_string(),
        "error" | "failed" => status.red().to_string(),
        _ => status.to_string(),
    }
}

/// Color a savings percentage: large reductions stand out
pub fn color_savings(percentage: f64) -> String {
    let formatted = format!("{:.1}%", percentage);
    if percentage >= 30.0 {
        formatted.green().to_string()
    } else if percentage > 0.0 {
        formatted.yellow().to_string()
    } else {
        formatted.normal().to_string()
    }
}
