//! Analyze command: build the optimization report for an inventory

use anyhow::{bail, Context, Result};
use rightsizer_lib::{
    AnalysisOutcome, InstanceAnalysis, OptimizationReport, RecommendationKind, ReportBuilder,
    RightsizerConfig, RunMetrics, StructuredLogger,
};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tabled::{settings::Style, Table, Tabled};

use crate::inventory::{load_inventory, sibling_path};
use crate::output::{
    color_savings, color_status, format_currency, format_shape, print_info, print_json,
    print_success, print_warning, OutputFormat,
};

/// Where the analyze command writes its files
#[derive(Debug, Clone)]
pub struct AnalyzeOptions {
    pub output_dir: PathBuf,
    pub snapshot: bool,
    pub metrics_out: Option<PathBuf>,
}

/// Files produced by one analysis run
#[derive(Debug, Serialize)]
struct WrittenFiles {
    report: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    snapshot: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    metrics: Option<PathBuf>,
}

#[derive(Serialize)]
struct AnalyzeOutput<'a> {
    files: &'a WrittenFiles,
    report: &'a OptimizationReport,
}

#[derive(Tabled, Serialize)]
struct SummaryRow {
    #[tabled(rename = "Instance")]
    name: String,
    #[tabled(rename = "Tier")]
    tier: String,
    #[tabled(rename = "Shape")]
    shape: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Current/mo")]
    current: String,
    #[tabled(rename = "Optimized/mo")]
    optimized: String,
    #[tabled(rename = "Savings")]
    savings: String,
}

impl From<&InstanceAnalysis> for SummaryRow {
    fn from(entry: &InstanceAnalysis) -> Self {
        let dash = || "-".to_string();
        let shape = match &entry.outcome {
            AnalysisOutcome::Analyzed { shape, .. } => format_shape(shape.vcpus, shape.memory_gb()),
            AnalysisOutcome::MetricsError { .. } => dash(),
        };
        let (current, optimized, savings) = match entry.cost() {
            Some(cost) => (
                format_currency(cost.current.total),
                format_currency(cost.optimized.total),
                color_savings(cost.savings.percentage),
            ),
            None => (dash(), dash(), dash()),
        };

        Self {
            name: entry.name.clone(),
            tier: entry.tier.clone(),
            shape,
            status: color_status(status_label(entry)),
            current,
            optimized,
            savings,
        }
    }
}

fn status_label(entry: &InstanceAnalysis) -> &'static str {
    let recommendations = match &entry.outcome {
        AnalysisOutcome::MetricsError { .. } => return "Error",
        AnalysisOutcome::Analyzed {
            recommendations, ..
        } => recommendations,
    };
    let has = |kind: RecommendationKind| recommendations.iter().any(|r| r.kind == kind);

    if has(RecommendationKind::NotRunning) {
        "Not running"
    } else if entry.cost().is_none() {
        "No cost"
    } else if entry.cost().map(|c| c.optimization_possible).unwrap_or(false) {
        "Optimizable"
    } else if has(RecommendationKind::MinimumSpec) {
        "At minimum"
    } else {
        "Right-sized"
    }
}

/// Name of the timestamped copy of a report
pub fn snapshot_file_name(report: &OptimizationReport) -> String {
    format!(
        "recommendation-{}.txt",
        report.generated_at.format("%Y%m%d_%H%M%S")
    )
}

/// Analyze an inventory and write the report files
pub fn analyze_inventory(
    config: &RightsizerConfig,
    inventory: &Path,
    options: &AnalyzeOptions,
    format: OutputFormat,
) -> Result<()> {
    let instances = load_inventory(inventory)?;
    if instances.is_empty() {
        bail!("No database instances found in {}", inventory.display());
    }
    if format == OutputFormat::Table {
        print_info(&format!(
            "Loaded {} entries from inventory for optimization.",
            instances.len()
        ));
    }

    let logger = StructuredLogger::new(inventory.display().to_string());
    let metrics = RunMetrics::new();
    let report = ReportBuilder::new(config)
        .with_logger(logger.clone())
        .with_metrics(metrics.clone())
        .build(&instances);
    let text = report.render();

    let report_path = sibling_path(inventory, "_optimization_report.txt");
    fs::write(&report_path, &text)
        .with_context(|| format!("Failed to write report: {}", report_path.display()))?;
    logger.log_report_written(&report_path.display().to_string());

    let snapshot = if options.snapshot {
        fs::create_dir_all(&options.output_dir).with_context(|| {
            format!(
                "Failed to create output directory: {}",
                options.output_dir.display()
            )
        })?;
        let path = options.output_dir.join(snapshot_file_name(&report));
        fs::write(&path, &text)
            .with_context(|| format!("Failed to write snapshot: {}", path.display()))?;
        logger.log_report_written(&path.display().to_string());
        Some(path)
    } else {
        None
    };

    if let Some(path) = &options.metrics_out {
        let exposition = metrics.encode_text().context("Failed to encode run metrics")?;
        fs::write(path, exposition)
            .with_context(|| format!("Failed to write metrics: {}", path.display()))?;
    }

    let files = WrittenFiles {
        report: report_path,
        snapshot,
        metrics: options.metrics_out.clone(),
    };

    match format {
        OutputFormat::Json => print_json(&AnalyzeOutput {
            files: &files,
            report: &report,
        }),
        OutputFormat::Table => {
            print_summary(&report, &files);
            Ok(())
        }
    }
}

fn print_summary(report: &OptimizationReport, files: &WrittenFiles) {
    let rows: Vec<SummaryRow> = report.entries.iter().map(SummaryRow::from).collect();
    println!("{}", Table::new(&rows).with(Style::rounded()));

    let totals = &report.totals;
    println!();
    println!(
        "Current monthly cost:   {}",
        format_currency(totals.current_monthly)
    );
    println!(
        "Optimized monthly cost: {}",
        format_currency(totals.optimized_monthly)
    );
    println!(
        "Potential savings:      {} ({:.1}%), {} per year",
        format_currency(totals.monthly_savings),
        totals.savings_percentage,
        format_currency(totals.annual_savings)
    );
    if totals.failed > 0 {
        print_warning(&format!(
            "{} instance(s) could not be analyzed and are excluded from totals",
            totals.failed
        ));
    }

    println!();
    print_success("Optimization report has been saved to:");
    println!("  - {}", files.report.display());
    if let Some(snapshot) = &files.snapshot {
        println!("  - {}", snapshot.display());
    }
    if let Some(metrics) = &files.metrics {
        println!("  - {} (metrics)", metrics.display());
    }
}
