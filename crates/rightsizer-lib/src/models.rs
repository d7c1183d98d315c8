//! Core data models for the rightsizer

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::MetricError;

/// State an instance must be in for rightsizing rules to apply
pub const RUNNABLE_STATE: &str = "RUNNABLE";

/// Availability type that doubles the instance cost
pub const REGIONAL_AVAILABILITY: &str = "REGIONAL";

/// Format a 0-1 fraction as a percentage with one decimal
pub fn format_percent(fraction: f64) -> String {
    format!("{:.1}%", fraction * 100.0)
}

fn default_numeric() -> String {
    "0".to_string()
}

fn default_availability() -> String {
    "ZONAL".to_string()
}

/// One row of the database inventory
///
/// Every field arrives as text; numeric fields are parsed on demand so a
/// malformed value only affects the instance it belongs to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstanceRecord {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub project_id: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub database_version: String,
    #[serde(default)]
    pub instance_type: String,
    #[serde(default)]
    pub tier: String,
    #[serde(default = "default_availability")]
    pub availability_type: String,
    #[serde(default)]
    pub activation_policy: String,
    #[serde(default)]
    pub backup_enabled: String,
    #[serde(default = "default_numeric")]
    pub disk_size_gb: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub create_time: String,
    #[serde(default)]
    pub public_ip: String,
    #[serde(default)]
    pub cert_expiry: String,
    #[serde(default = "default_numeric")]
    pub cpu_util: String,
    #[serde(default = "default_numeric")]
    pub memory_util: String,
    #[serde(default = "default_numeric")]
    pub disk_util: String,
    #[serde(default = "default_numeric")]
    pub connections: String,
    #[serde(default)]
    pub encrypted: String,
}

/// Utilization figures parsed from an inventory record
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UtilizationMetrics {
    pub cpu_util: f64,
    pub memory_util: f64,
    pub disk_util: f64,
    pub connections: u64,
}

/// Utilization figures plus provisioned disk size
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParsedMetrics {
    pub utilization: UtilizationMetrics,
    pub disk_size_gb: u64,
}

fn parse_float(field: &'static str, value: &str) -> Result<f64, MetricError> {
    value
        .trim()
        .parse::<f64>()
        .map_err(|source| MetricError::InvalidFloat {
            field,
            value: value.to_string(),
            source,
        })
}

fn parse_integer(field: &'static str, value: &str) -> Result<u64, MetricError> {
    value
        .trim()
        .parse::<u64>()
        .map_err(|source| MetricError::InvalidInteger {
            field,
            value: value.to_string(),
            source,
        })
}

impl InstanceRecord {
    /// Parse the three utilization fractions and the connection count
    pub fn parse_utilization(&self) -> Result<UtilizationMetrics, MetricError> {
        Ok(UtilizationMetrics {
            cpu_util: parse_float("cpu_util", &self.cpu_util)?,
            memory_util: parse_float("memory_util", &self.memory_util)?,
            disk_util: parse_float("disk_util", &self.disk_util)?,
            connections: parse_integer("connections", &self.connections)?,
        })
    }

    /// Parse the provisioned disk size in GB
    pub fn parse_disk_size(&self) -> Result<u64, MetricError> {
        parse_integer("disk_size_gb", &self.disk_size_gb)
    }

    /// Parse every numeric field the recommendation rules consume
    pub fn parse_metrics(&self) -> Result<ParsedMetrics, MetricError> {
        let utilization = self.parse_utilization()?;
        let disk_size_gb = self.parse_disk_size()?;
        Ok(ParsedMetrics {
            utilization,
            disk_size_gb,
        })
    }

    pub fn is_running(&self) -> bool {
        self.state == RUNNABLE_STATE
    }

    pub fn is_high_availability(&self) -> bool {
        self.availability_type == REGIONAL_AVAILABILITY
    }
}

/// Resource shape decoded from a machine tier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MachineShape {
    pub vcpus: f64,
    pub memory_mb: u32,
    /// Fractional-vCPU tier (`small`/`micro` families)
    pub shared_core: bool,
}

impl MachineShape {
    pub fn memory_gb(&self) -> f64 {
        f64::from(self.memory_mb) / 1024.0
    }
}

/// Resource dimension a resize hint applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Cpu,
    Memory,
    Disk,
}

/// Structured numeric target carried alongside a reduction recommendation
///
/// `new_value` is in vCPUs, GB of memory or GB of disk depending on
/// `dimension`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResizeHint {
    pub dimension: Dimension,
    pub new_value: f64,
}

/// Which rule produced a recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationKind {
    MetricsError,
    NotRunning,
    LowConnections,
    CpuReduce,
    SharedCoreSwitch,
    CpuMonitor,
    CpuIncrease,
    MemoryReduce,
    MemoryIncrease,
    DiskReduce,
    DiskIncrease,
    NeverActivated,
    Unused,
    MinimumSpec,
    RightSized,
}

impl RecommendationKind {
    /// Advice that asks for fewer resources; contradictory once the
    /// machine shape is already at its floor
    pub fn is_reduction(&self) -> bool {
        matches!(
            self,
            RecommendationKind::LowConnections
                | RecommendationKind::CpuReduce
                | RecommendationKind::MemoryReduce
                | RecommendationKind::DiskReduce
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RecommendationKind::MetricsError => "metrics_error",
            RecommendationKind::NotRunning => "not_running",
            RecommendationKind::LowConnections => "low_connections",
            RecommendationKind::CpuReduce => "cpu_reduce",
            RecommendationKind::SharedCoreSwitch => "shared_core_switch",
            RecommendationKind::CpuMonitor => "cpu_monitor",
            RecommendationKind::CpuIncrease => "cpu_increase",
            RecommendationKind::MemoryReduce => "memory_reduce",
            RecommendationKind::MemoryIncrease => "memory_increase",
            RecommendationKind::DiskReduce => "disk_reduce",
            RecommendationKind::DiskIncrease => "disk_increase",
            RecommendationKind::NeverActivated => "never_activated",
            RecommendationKind::Unused => "unused",
            RecommendationKind::MinimumSpec => "minimum_spec",
            RecommendationKind::RightSized => "right_sized",
        }
    }
}

/// A single piece of rightsizing advice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub kind: RecommendationKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<ResizeHint>,
}

impl Recommendation {
    pub fn new(kind: RecommendationKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            hint: None,
        }
    }

    pub fn with_hint(mut self, dimension: Dimension, new_value: f64) -> Self {
        self.hint = Some(ResizeHint {
            dimension,
            new_value,
        });
        self
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Monthly cost split by resource
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CostLines {
    pub cpu: f64,
    pub memory: f64,
    pub storage: f64,
    pub total: f64,
}

/// Savings between current and optimized configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Savings {
    pub monthly: f64,
    pub annual: f64,
    pub percentage: f64,
}

/// Before/after cost estimate for one instance
///
/// Money is rounded to cents and the percentage to one decimal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub current: CostLines,
    pub optimized: CostLines,
    pub savings: Savings,
    pub optimization_possible: bool,
}
