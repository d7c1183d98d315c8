//! Optimization report assembly
//!
//! Runs the recommendation engine and cost estimator over an inventory in
//! input order and accumulates totals. Rendering produces the plain-text
//! report that the CLI writes to disk.

use chrono::{DateTime, Local};
use serde::Serialize;
use std::time::Instant;

use crate::estimator::CostEstimator;
use crate::models::{format_percent, CostBreakdown, InstanceRecord, MachineShape, Recommendation, UtilizationMetrics};
use crate::observability::{RunMetrics, StructuredLogger};
use crate::recommender::RecommendationEngine;
use crate::settings::RightsizerConfig;

const REPORT_TITLE: &str = "=== Cloud SQL Instance Optimization Report ===";

/// Format a USD amount with two decimals
pub fn format_usd(amount: f64) -> String {
    format!("${:.2}", amount)
}

fn or_unknown(value: &str) -> &str {
    if value.is_empty() {
        "Unknown"
    } else {
        value
    }
}

/// Result of analyzing one instance
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AnalysisOutcome {
    /// A utilization field was malformed; nothing else was evaluated
    MetricsError { error: String },
    Analyzed {
        shape: MachineShape,
        utilization: UtilizationMetrics,
        recommendations: Vec<Recommendation>,
        #[serde(skip_serializing_if = "Option::is_none")]
        cost: Option<CostBreakdown>,
        #[serde(skip_serializing_if = "Option::is_none")]
        cost_error: Option<String>,
    },
}

/// Identity of an instance plus its analysis outcome
#[derive(Debug, Clone, Serialize)]
pub struct InstanceAnalysis {
    pub name: String,
    pub project_id: String,
    pub region: String,
    pub database_version: String,
    pub tier: String,
    pub high_availability: bool,
    pub disk_size_gb: String,
    pub outcome: AnalysisOutcome,
}

impl InstanceAnalysis {
    fn new(instance: &InstanceRecord, outcome: AnalysisOutcome) -> Self {
        Self {
            name: instance.name.clone(),
            project_id: instance.project_id.clone(),
            region: instance.location.clone(),
            database_version: instance.database_version.clone(),
            tier: instance.tier.clone(),
            high_availability: instance.is_high_availability(),
            disk_size_gb: instance.disk_size_gb.clone(),
            outcome,
        }
    }

    pub fn cost(&self) -> Option<&CostBreakdown> {
        match &self.outcome {
            AnalysisOutcome::Analyzed { cost, .. } => cost.as_ref(),
            AnalysisOutcome::MetricsError { .. } => None,
        }
    }
}

/// Aggregate cost figures across all costed instances
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ReportTotals {
    pub instances: usize,
    /// Instances included in the cost totals
    pub costed: usize,
    /// Instances with malformed metrics or failed costing
    pub failed: usize,
    pub current_monthly: f64,
    pub optimized_monthly: f64,
    pub monthly_savings: f64,
    pub savings_percentage: f64,
    pub annual_savings: f64,
}

impl ReportTotals {
    fn add(&mut self, cost: &CostBreakdown) {
        self.costed += 1;
        self.current_monthly += cost.current.total;
        self.optimized_monthly += cost.optimized.total;
    }

    fn finish(&mut self) {
        self.monthly_savings = self.current_monthly - self.optimized_monthly;
        self.savings_percentage = if self.current_monthly > 0.0 {
            self.monthly_savings / self.current_monthly * 100.0
        } else {
            0.0
        };
        self.annual_savings = self.monthly_savings * 12.0;
    }
}

/// A complete optimization report
#[derive(Debug, Clone, Serialize)]
pub struct OptimizationReport {
    pub generated_at: DateTime<Local>,
    pub entries: Vec<InstanceAnalysis>,
    pub totals: ReportTotals,
}

impl OptimizationReport {
    /// Render the report as text lines
    pub fn lines(&self) -> Vec<String> {
        let mut lines = vec![
            REPORT_TITLE.to_string(),
            format!("Generated on: {}", self.generated_at.format("%Y-%m-%d %H:%M:%S")),
            format!("Total instances analyzed: {}", self.entries.len()),
            String::new(),
        ];

        for entry in &self.entries {
            render_entry(entry, &mut lines);
        }

        let totals = &self.totals;
        lines.push("=== Summary ===".to_string());
        lines.push(format!(
            "Total current estimated monthly cost: {}",
            format_usd(totals.current_monthly)
        ));
        lines.push(format!(
            "Total optimized estimated monthly cost: {}",
            format_usd(totals.optimized_monthly)
        ));
        lines.push(format!(
            "Total potential monthly savings: {} ({:.1}%)",
            format_usd(totals.monthly_savings),
            totals.savings_percentage
        ));
        lines.push(format!(
            "Projected annual savings: {}",
            format_usd(totals.annual_savings)
        ));
        lines.push(String::new());
        lines.push("Note: Cost estimates are based on GCP Cloud SQL pricing.".to_string());
        lines.push(
            "      Actual costs may vary based on commitment discounts, network usage, and other factors."
                .to_string(),
        );
        lines.push(
            "      Instances already at minimum specifications will show no potential savings."
                .to_string(),
        );
        lines
    }

    /// Render the report as newline-terminated text
    pub fn render(&self) -> String {
        let mut text = self.lines().join("\n");
        text.push('\n');
        text
    }
}

fn render_entry(entry: &InstanceAnalysis, lines: &mut Vec<String>) {
    lines.push(format!(
        "Instance: {} (Project: {})",
        or_unknown(&entry.name),
        or_unknown(&entry.project_id)
    ));

    let (shape, utilization, recommendations, cost, cost_error) = match &entry.outcome {
        AnalysisOutcome::MetricsError { error } => {
            lines.push(format!("  Error processing metrics: {}", error));
            lines.push(String::new());
            return;
        }
        AnalysisOutcome::Analyzed {
            shape,
            utilization,
            recommendations,
            cost,
            cost_error,
        } => (shape, utilization, recommendations, cost, cost_error),
    };

    lines.push(format!("  Region: {}", or_unknown(&entry.region)));
    lines.push(format!("  Database Version: {}", or_unknown(&entry.database_version)));
    lines.push(format!(
        "  High Availability: {}",
        if entry.high_availability { "Yes" } else { "No" }
    ));
    lines.push(format!(
        "  Current configuration: {} ({} vCPUs, {:.2} GB memory), {} GB storage",
        or_unknown(&entry.tier),
        shape.vcpus,
        shape.memory_gb(),
        entry.disk_size_gb
    ));
    lines.push("  Usage Statistics:".to_string());
    lines.push(format!(
        "    - CPU: {} avg. utilization",
        format_percent(utilization.cpu_util)
    ));
    lines.push(format!(
        "    - Memory: {} avg. utilization",
        format_percent(utilization.memory_util)
    ));
    lines.push(format!(
        "    - Storage: {} utilization",
        format_percent(utilization.disk_util)
    ));
    lines.push(format!(
        "    - Connections: {} active connections",
        utilization.connections
    ));

    lines.push("  Recommendations:".to_string());
    for rec in recommendations {
        lines.push(format!("    - {}", rec));
    }

    lines.push(format!(
        "  Cost Analysis (Based on GCP pricing for region {}):",
        or_unknown(&entry.region)
    ));
    match (cost, cost_error) {
        (Some(cost), _) => render_cost(cost, lines),
        (None, Some(error)) => lines.push(format!("    Cost estimate unavailable: {}", error)),
        (None, None) => lines.push("    Cost estimate unavailable".to_string()),
    }
    lines.push(String::new());
}

fn render_cost(cost: &CostBreakdown, lines: &mut Vec<String>) {
    lines.push("    Current Monthly Costs:".to_string());
    lines.push(format!("      - Compute (CPU): {}", format_usd(cost.current.cpu)));
    lines.push(format!("      - Memory: {}", format_usd(cost.current.memory)));
    lines.push(format!("      - Storage: {}", format_usd(cost.current.storage)));
    lines.push(format!("      - Total: {}", format_usd(cost.current.total)));

    if !cost.optimization_possible {
        lines.push("    Optimized Monthly Costs: No cost optimization possible for this instance".to_string());
        lines.push("    Potential Savings: $0.00 (0.0%)".to_string());
        return;
    }

    lines.push("    Optimized Monthly Costs:".to_string());
    lines.push(format!("      - Compute (CPU): {}", format_usd(cost.optimized.cpu)));
    lines.push(format!("      - Memory: {}", format_usd(cost.optimized.memory)));
    lines.push(format!("      - Storage: {}", format_usd(cost.optimized.storage)));
    lines.push(format!("      - Total: {}", format_usd(cost.optimized.total)));
    lines.push("    Potential Savings:".to_string());
    lines.push(format!("      - Monthly: {}", format_usd(cost.savings.monthly)));
    lines.push(format!("      - Annual: {}", format_usd(cost.savings.annual)));
    lines.push(format!(
        "      - Percentage Reduction: {:.1}%",
        cost.savings.percentage
    ));
}

/// Builds optimization reports from an inventory
pub struct ReportBuilder {
    engine: RecommendationEngine,
    estimator: CostEstimator,
    logger: StructuredLogger,
    metrics: Option<RunMetrics>,
}

impl ReportBuilder {
    pub fn new(config: &RightsizerConfig) -> Self {
        Self {
            engine: RecommendationEngine::new(config.limits),
            estimator: CostEstimator::new(config.pricing.clone()),
            logger: StructuredLogger::new("inventory"),
            metrics: None,
        }
    }

    pub fn with_logger(mut self, logger: StructuredLogger) -> Self {
        self.logger = logger;
        self
    }

    pub fn with_metrics(mut self, metrics: RunMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Build a report stamped with the current local time
    pub fn build(&self, instances: &[InstanceRecord]) -> OptimizationReport {
        self.build_at(instances, Local::now())
    }

    /// Build a report with an explicit generation timestamp
    pub fn build_at(
        &self,
        instances: &[InstanceRecord],
        generated_at: DateTime<Local>,
    ) -> OptimizationReport {
        let started = Instant::now();
        self.logger.log_run_started(instances.len());

        let mut totals = ReportTotals {
            instances: instances.len(),
            ..Default::default()
        };
        let mut entries = Vec::with_capacity(instances.len());

        for instance in instances {
            let analysis = self.analyze(instance);
            match analysis.cost() {
                Some(cost) => totals.add(cost),
                None => totals.failed += 1,
            }
            entries.push(analysis);
        }
        totals.finish();

        if let Some(metrics) = &self.metrics {
            metrics.set_totals(
                totals.current_monthly,
                totals.optimized_monthly,
                totals.monthly_savings,
            );
            metrics.observe_report_build(started.elapsed().as_secs_f64());
        }
        self.logger
            .log_run_completed(totals.costed, totals.failed, totals.monthly_savings);

        OptimizationReport {
            generated_at,
            entries,
            totals,
        }
    }

    /// Analyze a single instance
    pub fn analyze(&self, instance: &InstanceRecord) -> InstanceAnalysis {
        let utilization = match instance.parse_utilization() {
            Ok(utilization) => utilization,
            Err(e) => {
                let error = e.to_string();
                self.logger
                    .log_metrics_parse_failed(&instance.name, &instance.project_id, &error);
                if let Some(metrics) = &self.metrics {
                    metrics.inc_metric_parse_failures();
                }
                return InstanceAnalysis::new(instance, AnalysisOutcome::MetricsError { error });
            }
        };

        if !self.estimator.pricing().is_known_region(&instance.location) {
            self.logger.log_unknown_region(&instance.name, &instance.location);
        }

        let shape = self.engine.tier_parser().parse(&instance.tier);
        let recommendations = self.engine.recommend(instance, &shape);

        let (cost, cost_error) = match self.estimator.estimate(instance, &shape, &recommendations) {
            Ok(cost) => (Some(cost), None),
            Err(e) => {
                let error = e.to_string();
                self.logger
                    .log_cost_estimate_failed(&instance.name, &instance.project_id, &error);
                if let Some(metrics) = &self.metrics {
                    metrics.inc_cost_estimate_failures();
                }
                (None, Some(error))
            }
        };

        if let Some(metrics) = &self.metrics {
            metrics.inc_instances_analyzed();
            for rec in &recommendations {
                metrics.inc_recommendation(rec.kind.as_str());
            }
        }
        self.logger.log_instance_analyzed(
            &instance.name,
            &instance.project_id,
            &instance.tier,
            recommendations.len(),
            cost.map(|c| c.savings.monthly),
        );

        InstanceAnalysis::new(
            instance,
            AnalysisOutcome::Analyzed {
                shape,
                utilization,
                recommendations,
                cost,
                cost_error,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(name: &str, tier: &str, cpu: &str, disk_gb: &str) -> InstanceRecord {
        InstanceRecord {
            name: name.to_string(),
            project_id: "acme-prod".to_string(),
            location: "us-central1".to_string(),
            database_version: "MYSQL_8_0".to_string(),
            tier: tier.to_string(),
            availability_type: "ZONAL".to_string(),
            activation_policy: "ALWAYS".to_string(),
            state: "RUNNABLE".to_string(),
            cpu_util: cpu.to_string(),
            memory_util: "0.5".to_string(),
            disk_util: "0.5".to_string(),
            disk_size_gb: disk_gb.to_string(),
            connections: "100".to_string(),
            ..Default::default()
        }
    }

    fn timestamp() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).single().unwrap()
    }

    fn builder() -> ReportBuilder {
        ReportBuilder::new(&RightsizerConfig::default())
    }

    #[test]
    fn test_format_helpers() {
        assert_eq!(format_usd(107.123), "$107.12");
    }

    #[test]
    fn test_header_and_summary() {
        let report = builder().build_at(&[record("a", "db-custom-2-7680", "0.5", "50")], timestamp());
        let lines = report.lines();
        assert_eq!(lines[0], REPORT_TITLE);
        assert_eq!(lines[1], "Generated on: 2024-05-01 09:30:00");
        assert_eq!(lines[2], "Total instances analyzed: 1");
        assert!(lines.contains(&"Total current estimated monthly cost: $107.12".to_string()));
        assert!(lines.contains(&"Total potential monthly savings: $0.00 (0.0%)".to_string()));
        assert!(report.render().ends_with("no potential savings.\n"));
    }

    #[test]
    fn test_instance_block() {
        let report = builder().build_at(&[record("orders", "db-custom-2-7680", "0.5", "50")], timestamp());
        let lines = report.lines();
        assert!(lines.contains(&"Instance: orders (Project: acme-prod)".to_string()));
        assert!(lines.contains(
            &"  Current configuration: db-custom-2-7680 (2 vCPUs, 7.50 GB memory), 50 GB storage"
                .to_string()
        ));
        assert!(lines.contains(&"    - CPU: 50.0% avg. utilization".to_string()));
        assert!(lines.contains(&"    - Connections: 100 active connections".to_string()));
        assert!(lines.contains(
            &"    Optimized Monthly Costs: No cost optimization possible for this instance"
                .to_string()
        ));
    }

    #[test]
    fn test_analyze_carries_identity_for_every_outcome() {
        let builder = builder();
        let mut bad = record("bad", "db-n1-standard-2", "not-a-number", "50");
        bad.availability_type = "REGIONAL".to_string();
        let good = record("good", "db-custom-2-7680", "0.5", "50");

        let failed = builder.analyze(&bad);
        assert_eq!(failed.name, "bad");
        assert_eq!(failed.tier, "db-n1-standard-2");
        assert!(failed.high_availability);
        match &failed.outcome {
            AnalysisOutcome::MetricsError { error } => assert!(error.contains("not-a-number")),
            other => panic!("expected metrics error, got {:?}", other),
        }

        let analyzed = builder.analyze(&good);
        assert_eq!(analyzed.name, "good");
        assert_eq!(analyzed.region, "us-central1");
        assert_eq!(analyzed.disk_size_gb, "50");
        assert!(matches!(analyzed.outcome, AnalysisOutcome::Analyzed { .. }));
    }

    #[test]
    fn test_metric_error_excluded_from_totals() {
        let good = record("good", "db-custom-2-7680", "0.5", "50");
        let bad = record("bad", "db-custom-2-7680", "not-a-number", "50");
        let report = builder().build_at(&[bad, good], timestamp());

        assert_eq!(report.totals.instances, 2);
        assert_eq!(report.totals.costed, 1);
        assert_eq!(report.totals.failed, 1);
        assert_eq!(report.totals.current_monthly, 107.12);

        let lines = report.lines();
        let idx = lines
            .iter()
            .position(|l| l == "Instance: bad (Project: acme-prod)")
            .unwrap();
        assert!(lines[idx + 1].starts_with("  Error processing metrics:"));
        assert_eq!(lines[idx + 2], "");
    }

    #[test]
    fn test_bad_disk_size_reported_but_not_totalled() {
        let report = builder().build_at(&[record("disky", "db-custom-2-7680", "0.5", "lots")], timestamp());
        let entry = &report.entries[0];
        assert!(entry.cost().is_none());
        match &entry.outcome {
            AnalysisOutcome::Analyzed { recommendations, cost_error, .. } => {
                assert!(recommendations[0].message.starts_with("Error processing metrics"));
                assert!(cost_error.is_some());
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(report.totals.failed, 1);
        assert_eq!(report.totals.current_monthly, 0.0);
    }

    #[test]
    fn test_all_failed_still_reports() {
        let report = builder().build_at(&[record("x", "db-f1-micro", "bad", "10")], timestamp());
        assert_eq!(report.totals.current_monthly, 0.0);
        assert_eq!(report.totals.savings_percentage, 0.0);
        assert!(report
            .lines()
            .contains(&"Projected annual savings: $0.00".to_string()));
    }

    #[test]
    fn test_totals_accumulate_savings() {
        let idle = record("idle", "db-custom-4-15360", "0.03", "100");
        let busy = record("busy", "db-custom-2-7680", "0.5", "50");
        let report = builder().build_at(&[idle, busy], timestamp());

        let idle_cost = report.entries[0].cost().unwrap();
        assert!(idle_cost.optimization_possible);
        let expected_current = idle_cost.current.total + 107.12;
        assert!((report.totals.current_monthly - expected_current).abs() < 1e-9);
        // Totals are summed from rounded figures, so allow a cent of drift
        assert!((report.totals.monthly_savings - idle_cost.savings.monthly).abs() < 0.011);
        assert!((report.totals.annual_savings - report.totals.monthly_savings * 12.0).abs() < 1e-9);

        let lines = report.lines();
        assert!(lines.contains(&"    Potential Savings:".to_string()));
    }

    #[test]
    fn test_json_serialization() {
        let report = builder().build_at(&[record("a", "db-custom-2-7680", "0.5", "50")], timestamp());
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["entries"][0]["outcome"]["status"], "analyzed");
        assert_eq!(json["totals"]["costed"], 1);
    }
}
