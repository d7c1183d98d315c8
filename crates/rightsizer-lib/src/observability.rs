//! Observability infrastructure for the rightsizer
//!
//! Provides:
//! - Prometheus metrics for a report run (instances analyzed, failures,
//!   recommendations by kind, savings, build latency)
//! - Structured logging with tracing

use prometheus::{
    register_gauge, register_histogram, register_int_counter, register_int_counter_vec, Encoder,
    Gauge, Histogram, IntCounter, IntCounterVec, TextEncoder,
};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Histogram buckets for report build latency (in seconds)
const BUILD_LATENCY_BUCKETS: &[f64] = &[0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<RunMetricsInner> = OnceLock::new();

struct RunMetricsInner {
    instances_analyzed: IntCounter,
    metric_parse_failures: IntCounter,
    cost_estimate_failures: IntCounter,
    recommendations: IntCounterVec,
    current_monthly_cost: Gauge,
    optimized_monthly_cost: Gauge,
    monthly_savings: Gauge,
    report_build_seconds: Histogram,
}

impl RunMetricsInner {
    fn new() -> Self {
        Self {
            instances_analyzed: register_int_counter!(
                "csr_instances_analyzed_total",
                "Database instances that received recommendations"
            )
            .expect("Failed to register instances_analyzed"),

            metric_parse_failures: register_int_counter!(
                "csr_metric_parse_failures_total",
                "Instances skipped because a utilization field was malformed"
            )
            .expect("Failed to register metric_parse_failures"),

            cost_estimate_failures: register_int_counter!(
                "csr_cost_estimate_failures_total",
                "Instances excluded from totals because costing failed"
            )
            .expect("Failed to register cost_estimate_failures"),

            recommendations: register_int_counter_vec!(
                "csr_recommendations_total",
                "Recommendations emitted by rule",
                &["kind"]
            )
            .expect("Failed to register recommendations"),

            current_monthly_cost: register_gauge!(
                "csr_current_monthly_cost_usd",
                "Estimated current monthly cost of the last report"
            )
            .expect("Failed to register current_monthly_cost"),

            optimized_monthly_cost: register_gauge!(
                "csr_optimized_monthly_cost_usd",
                "Estimated optimized monthly cost of the last report"
            )
            .expect("Failed to register optimized_monthly_cost"),

            monthly_savings: register_gauge!(
                "csr_potential_monthly_savings_usd",
                "Potential monthly savings of the last report"
            )
            .expect("Failed to register monthly_savings"),

            report_build_seconds: register_histogram!(
                "csr_report_build_seconds",
                "Time spent building an optimization report",
                BUILD_LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register report_build_seconds"),
        }
    }
}

/// Lightweight handle to the process-wide run metrics
///
/// Clones share the same underlying collectors.
#[derive(Clone)]
pub struct RunMetrics {
    _private: (),
}

impl Default for RunMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl RunMetrics {
    /// Create a new metrics handle (registers collectors on first call)
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(RunMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &RunMetricsInner {
        GLOBAL_METRICS.get_or_init(RunMetricsInner::new)
    }

    pub fn inc_instances_analyzed(&self) {
        self.inner().instances_analyzed.inc();
    }

    pub fn inc_metric_parse_failures(&self) {
        self.inner().metric_parse_failures.inc();
    }

    pub fn inc_cost_estimate_failures(&self) {
        self.inner().cost_estimate_failures.inc();
    }

    pub fn inc_recommendation(&self, kind: &str) {
        self.inner().recommendations.with_label_values(&[kind]).inc();
    }

    pub fn set_totals(&self, current: f64, optimized: f64, savings: f64) {
        self.inner().current_monthly_cost.set(current);
        self.inner().optimized_monthly_cost.set(optimized);
        self.inner().monthly_savings.set(savings);
    }

    pub fn observe_report_build(&self, duration_secs: f64) {
        self.inner().report_build_seconds.observe(duration_secs);
    }

    /// Render every registered collector in the Prometheus text format
    pub fn encode_text(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&prometheus::gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

/// Structured logger for report-run events
#[derive(Clone)]
pub struct StructuredLogger {
    source: String,
}

impl StructuredLogger {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }

    pub fn log_run_started(&self, instance_count: usize) {
        info!(
            event = "run_started",
            source = %self.source,
            instance_count = instance_count,
            "Starting rightsizing analysis"
        );
    }

    pub fn log_instance_analyzed(
        &self,
        name: &str,
        project_id: &str,
        tier: &str,
        recommendation_count: usize,
        monthly_savings: Option<f64>,
    ) {
        info!(
            event = "instance_analyzed",
            source = %self.source,
            instance = %name,
            project_id = %project_id,
            tier = %tier,
            recommendation_count = recommendation_count,
            monthly_savings = ?monthly_savings,
            "Instance analyzed"
        );
    }

    pub fn log_metrics_parse_failed(&self, name: &str, project_id: &str, error: &str) {
        warn!(
            event = "metrics_parse_failed",
            source = %self.source,
            instance = %name,
            project_id = %project_id,
            error = %error,
            "Skipping instance with malformed metrics"
        );
    }

    pub fn log_cost_estimate_failed(&self, name: &str, project_id: &str, error: &str) {
        warn!(
            event = "cost_estimate_failed",
            source = %self.source,
            instance = %name,
            project_id = %project_id,
            error = %error,
            "Excluding instance from cost totals"
        );
    }

    pub fn log_unknown_region(&self, name: &str, region: &str) {
        info!(
            event = "unknown_region",
            source = %self.source,
            instance = %name,
            region = %region,
            "Region not in pricing table, using default prices"
        );
    }

    pub fn log_report_written(&self, path: &str) {
        info!(
            event = "report_written",
            source = %self.source,
            path = %path,
            "Optimization report written"
        );
    }

    pub fn log_run_completed(&self, analyzed: usize, failed: usize, monthly_savings: f64) {
        info!(
            event = "run_completed",
            source = %self.source,
            analyzed = analyzed,
            failed = failed,
            monthly_savings = monthly_savings,
            "Rightsizing analysis complete"
        );
    }
}
