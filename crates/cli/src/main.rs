//! Cloud SQL Rightsizer CLI
//!
//! A command-line tool for analyzing a database inventory, producing
//! rightsizing recommendations and estimating the cost savings.

mod commands;
mod config;
mod inventory;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{analyze, pricing, table};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Cloud SQL Rightsizer CLI
#[derive(Parser)]
#[command(name = "csr")]
#[command(author, version, about = "CLI for Cloud SQL Rightsizer", long_about = None)]
pub struct Cli {
    /// Path to a configuration file (can also be set via CSR_CONFIG env var)
    #[arg(long, env = "CSR_CONFIG")]
    pub config: Option<String>,

    /// Output format
    #[arg(long, short, default_value = "table")]
    pub format: output::OutputFormat,

    /// Enable verbose output
    #[arg(long, short)]
    pub verbose: bool,

    /// Emit logs as JSON
    #[arg(long)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze an inventory and write the optimization report
    Analyze {
        /// Inventory file (CSV, or JSON when the extension is .json)
        inventory: PathBuf,

        /// Directory for the timestamped recommendation snapshot
        #[arg(long, short, default_value = ".")]
        output_dir: PathBuf,

        /// Skip writing the timestamped snapshot
        #[arg(long)]
        no_snapshot: bool,

        /// Write run metrics in Prometheus text format to this file
        #[arg(long)]
        metrics_out: Option<PathBuf>,
    },

    /// Render an inventory CSV as an ASCII table
    Table {
        /// Inventory CSV file
        inventory: PathBuf,
    },

    /// Show the effective pricing table
    Pricing {
        /// Show only the prices a region resolves to
        #[arg(long, short)]
        region: Option<String>,
    },
}

fn init_tracing(verbose: bool, json: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    let settings = config::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Analyze {
            inventory,
            output_dir,
            no_snapshot,
            metrics_out,
        } => {
            let options = analyze::AnalyzeOptions {
                output_dir,
                snapshot: !no_snapshot,
                metrics_out,
            };
            analyze::analyze_inventory(&settings, &inventory, &options, cli.format)?;
        }
        Commands::Table { inventory } => {
            table::convert_to_table(&inventory, cli.format)?;
        }
        Commands::Pricing { region } => {
            pricing::show_pricing(&settings.pricing, region.as_deref(), cli.format)?;
        }
    }

    Ok(())
}
