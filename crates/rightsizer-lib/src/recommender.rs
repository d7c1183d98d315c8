//! Utilization-based rightsizing rules
//!
//! Rules run in a fixed order and each may append one recommendation.
//! Reduction advice carries a [`ResizeHint`](crate::models::ResizeHint) so
//! the cost estimator never has to read the message text.

use crate::models::{
    format_percent, Dimension, InstanceRecord, MachineShape, ParsedMetrics, Recommendation,
    RecommendationKind,
};
use crate::settings::SizingLimits;
use crate::tier::TierParser;

/// Connections per vCPU below which the instance is considered oversized
pub const CONNECTIONS_PER_VCPU: f64 = 20.0;

/// CPU utilization below which halving vCPUs is advised
pub const CPU_VERY_LOW: f64 = 0.05;

/// CPU utilization below which a 40% vCPU cut is advised
pub const CPU_LOW: f64 = 0.20;

/// CPU utilization above which more vCPUs are advised
pub const CPU_HIGH: f64 = 0.80;

/// Memory utilization below which a 30% cut is advised
pub const MEMORY_LOW: f64 = 0.30;

/// Memory utilization above which a 30% increase is advised
pub const MEMORY_HIGH: f64 = 0.85;

/// Disk utilization below which a 40% cut is advised
pub const DISK_VERY_LOW: f64 = 0.20;

/// Disk utilization below which large disks get a 30% cut
pub const DISK_LOW: f64 = 0.50;

/// Disk utilization above which growth is advised
pub const DISK_HIGH: f64 = 0.85;

/// Disks above this size qualify for the moderate reduction rule
pub const LARGE_DISK_GB: u64 = 100;

/// CPU utilization treated as idle when no connections are open
pub const IDLE_CPU: f64 = 0.01;

const NEVER_ACTIVATION: &str = "NEVER";

/// Produces ordered rightsizing advice for one instance
#[derive(Debug, Clone, Default)]
pub struct RecommendationEngine {
    parser: TierParser,
}

impl RecommendationEngine {
    pub fn new(limits: SizingLimits) -> Self {
        Self {
            parser: TierParser::new(limits),
        }
    }

    pub fn tier_parser(&self) -> &TierParser {
        &self.parser
    }

    fn limits(&self) -> &SizingLimits {
        self.parser.limits()
    }

    /// Generate recommendations for an instance with an already decoded shape
    ///
    /// A malformed numeric field yields a single diagnostic recommendation.
    /// Instances that are not running get a single notice.
    pub fn recommend(&self, instance: &InstanceRecord, shape: &MachineShape) -> Vec<Recommendation> {
        let metrics = match instance.parse_metrics() {
            Ok(metrics) => metrics,
            Err(e) => {
                return vec![Recommendation::new(
                    RecommendationKind::MetricsError,
                    format!("Error processing metrics: {}", e),
                )]
            }
        };

        if !instance.is_running() {
            return vec![Recommendation::new(
                RecommendationKind::NotRunning,
                format!(
                    "Instance is in {} state. No optimization possible until it's running.",
                    instance.state
                ),
            )];
        }

        let at_minimum = self.parser.is_at_minimum(shape);
        let mut recommendations = Vec::new();

        self.connection_rule(shape, &metrics, at_minimum, &mut recommendations);
        self.cpu_rules(shape, &metrics, at_minimum, &mut recommendations);
        self.memory_rules(shape, &metrics, &mut recommendations);
        self.disk_rules(&metrics, &mut recommendations);
        idle_rules(instance, &metrics, &mut recommendations);

        if at_minimum {
            apply_floor(&metrics, &mut recommendations);
        }

        if recommendations.is_empty() {
            recommendations.push(Recommendation::new(
                RecommendationKind::RightSized,
                "Instance appears to be appropriately sized based on current utilization.",
            ));
        }

        recommendations
    }

    fn connection_rule(
        &self,
        shape: &MachineShape,
        metrics: &ParsedMetrics,
        at_minimum: bool,
        out: &mut Vec<Recommendation>,
    ) {
        let connections = metrics.utilization.connections;
        if shape.vcpus > 1.0
            && (connections as f64) < shape.vcpus * CONNECTIONS_PER_VCPU
            && !at_minimum
        {
            out.push(Recommendation::new(
                RecommendationKind::LowConnections,
                format!(
                    "Low connection count ({}) relative to vCPUs ({}). Consider reducing vCPUs.",
                    connections, shape.vcpus
                ),
            ));
        }
    }

    fn cpu_rules(
        &self,
        shape: &MachineShape,
        metrics: &ParsedMetrics,
        at_minimum: bool,
        out: &mut Vec<Recommendation>,
    ) {
        let cpu_util = metrics.utilization.cpu_util;
        let vcpus = shape.vcpus;
        let min_vcpus = self.limits().min_vcpus;

        if cpu_util < CPU_VERY_LOW {
            if vcpus > 1.0 && !at_minimum {
                let target = (vcpus / 2.0).floor().max(min_vcpus);
                out.push(
                    Recommendation::new(
                        RecommendationKind::CpuReduce,
                        format!(
                            "CPU utilization very low (<5%). Current: {} vCPUs. Recommend reducing to {} vCPUs.",
                            vcpus, target
                        ),
                    )
                    .with_hint(Dimension::Cpu, target),
                );
            } else if !shape.shared_core && !at_minimum {
                out.push(Recommendation::new(
                    RecommendationKind::SharedCoreSwitch,
                    "CPU utilization very low (<5%). Consider switching to a shared-core instance type.",
                ));
            }
        } else if cpu_util < CPU_LOW {
            if vcpus > 2.0 && !at_minimum {
                let target = (vcpus * 0.6).floor().max(min_vcpus);
                out.push(
                    Recommendation::new(
                        RecommendationKind::CpuReduce,
                        format!(
                            "CPU utilization low (<20%). Current: {} vCPUs. Recommend reducing to {} vCPUs.",
                            vcpus, target
                        ),
                    )
                    .with_hint(Dimension::Cpu, target),
                );
            } else if !at_minimum {
                out.push(Recommendation::new(
                    RecommendationKind::CpuMonitor,
                    "CPU utilization low (<20%). Monitor if this usage pattern continues.",
                ));
            }
        } else if cpu_util > CPU_HIGH {
            out.push(Recommendation::new(
                RecommendationKind::CpuIncrease,
                format!(
                    "CPU utilization high (>80%). Consider upgrading to {} vCPUs for better performance.",
                    vcpus + 2.0
                ),
            ));
        }
    }

    fn memory_rules(&self, shape: &MachineShape, metrics: &ParsedMetrics, out: &mut Vec<Recommendation>) {
        let memory_util = metrics.utilization.memory_util;
        let memory_mb = f64::from(shape.memory_mb);
        let memory_gb = shape.memory_gb();
        let min_memory_gb = self.limits().min_memory_gb;

        if memory_util < MEMORY_LOW && memory_gb > min_memory_gb {
            let new_memory_mb = (memory_mb * 0.7).floor().max(min_memory_gb * 1024.0);
            let new_memory_gb = new_memory_mb / 1024.0;
            if new_memory_gb < memory_gb {
                let shown = format!("{:.1}", new_memory_gb);
                let target = shown.parse::<f64>().unwrap_or(new_memory_gb);
                out.push(
                    Recommendation::new(
                        RecommendationKind::MemoryReduce,
                        format!(
                            "Memory utilization low (<30%). Current: {:.1} GB. Recommend reducing to {} GB.",
                            memory_gb, shown
                        ),
                    )
                    .with_hint(Dimension::Memory, target),
                );
            }
        } else if memory_util > MEMORY_HIGH {
            let new_memory_gb = (memory_mb * 1.3).floor() / 1024.0;
            out.push(Recommendation::new(
                RecommendationKind::MemoryIncrease,
                format!(
                    "Memory utilization high (>85%). Consider increasing memory from {:.1} GB to {:.1} GB.",
                    memory_gb, new_memory_gb
                ),
            ));
        }
    }

    fn disk_rules(&self, metrics: &ParsedMetrics, out: &mut Vec<Recommendation>) {
        let disk_util = metrics.utilization.disk_util;
        let disk_size_gb = metrics.disk_size_gb;
        let min_disk_gb = self.limits().min_disk_gb;

        if disk_util < DISK_VERY_LOW && disk_size_gb > min_disk_gb {
            let new_size = scale_disk(disk_size_gb, 0.6).max(min_disk_gb);
            if new_size < disk_size_gb {
                out.push(
                    Recommendation::new(
                        RecommendationKind::DiskReduce,
                        format!(
                            "Disk utilization very low ({}) with {} GB. Consider reducing to {} GB.",
                            format_percent(disk_util),
                            disk_size_gb,
                            new_size
                        ),
                    )
                    .with_hint(Dimension::Disk, new_size as f64),
                );
            }
        } else if disk_util < DISK_LOW && disk_size_gb > LARGE_DISK_GB {
            let new_size = scale_disk(disk_size_gb, 0.7).max(min_disk_gb);
            if new_size < disk_size_gb {
                out.push(
                    Recommendation::new(
                        RecommendationKind::DiskReduce,
                        format!(
                            "Disk utilization low ({}) with {} GB. Consider reducing to {} GB.",
                            format_percent(disk_util),
                            disk_size_gb,
                            new_size
                        ),
                    )
                    .with_hint(Dimension::Disk, new_size as f64),
                );
            }
        } else if disk_util > DISK_HIGH {
            out.push(Recommendation::new(
                RecommendationKind::DiskIncrease,
                format!(
                    "Disk utilization high ({}). Consider increasing disk size from {} GB to {} GB.",
                    format_percent(disk_util),
                    disk_size_gb,
                    scale_disk(disk_size_gb, 1.3)
                ),
            ));
        }
    }
}

fn scale_disk(size_gb: u64, factor: f64) -> u64 {
    (size_gb as f64 * factor).floor() as u64
}

fn idle_rules(instance: &InstanceRecord, metrics: &ParsedMetrics, out: &mut Vec<Recommendation>) {
    let utilization = &metrics.utilization;

    if instance.activation_policy == NEVER_ACTIVATION
        && utilization.cpu_util == 0.0
        && utilization.memory_util == 0.0
    {
        out.push(Recommendation::new(
            RecommendationKind::NeverActivated,
            "Instance never activated but provisioned. Consider deleting if not needed.",
        ));
    }

    if utilization.connections == 0 && utilization.cpu_util < IDLE_CPU && instance.is_running() {
        out.push(Recommendation::new(
            RecommendationKind::Unused,
            "Instance appears unused (no connections, negligible CPU usage). Consider stopping or deleting if not needed.",
        ));
    }
}

/// Drop reductions for a shape already at its floor and, when the instance
/// is also underutilized, suggest consolidation instead.
fn apply_floor(metrics: &ParsedMetrics, out: &mut Vec<Recommendation>) {
    out.retain(|rec| !rec.kind.is_reduction());

    let underutilized =
        metrics.utilization.cpu_util < CPU_LOW && metrics.utilization.memory_util < MEMORY_LOW;
    let has_unused = out.iter().any(|rec| rec.kind == RecommendationKind::Unused);

    if underutilized && !has_unused {
        out.push(Recommendation::new(
            RecommendationKind::MinimumSpec,
            "Instance is already at minimum specifications. Consider instance consolidation or stopping if not needed.",
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tier::parse_shape;

    fn instance(tier: &str, cpu: &str, memory: &str, disk: &str, disk_gb: &str, conns: &str) -> InstanceRecord {
        InstanceRecord {
            name: "inventory-db".to_string(),
            project_id: "acme-prod".to_string(),
            location: "us-central1".to_string(),
            database_version: "POSTGRES_13".to_string(),
            tier: tier.to_string(),
            availability_type: "ZONAL".to_string(),
            activation_policy: "ALWAYS".to_string(),
            state: "RUNNABLE".to_string(),
            cpu_util: cpu.to_string(),
            memory_util: memory.to_string(),
            disk_util: disk.to_string(),
            disk_size_gb: disk_gb.to_string(),
            connections: conns.to_string(),
            ..Default::default()
        }
    }

    fn run(record: &InstanceRecord) -> Vec<Recommendation> {
        let engine = RecommendationEngine::default();
        engine.recommend(record, &parse_shape(&record.tier))
    }

    fn kinds(recs: &[Recommendation]) -> Vec<RecommendationKind> {
        recs.iter().map(|r| r.kind).collect()
    }

    #[test]
    fn test_malformed_metric_short_circuits() {
        let record = instance("db-custom-4-15360", "abc", "0.1", "0.1", "100", "5");
        let recs = run(&record);
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].kind, RecommendationKind::MetricsError);
        assert!(recs[0].message.starts_with("Error processing metrics:"));
    }

    #[test]
    fn test_not_running_short_circuits() {
        let mut record = instance("db-custom-4-15360", "0.01", "0.1", "0.1", "100", "0");
        record.state = "SUSPENDED".to_string();
        let recs = run(&record);
        assert_eq!(recs.len(), 1);
        assert_eq!(
            recs[0].message,
            "Instance is in SUSPENDED state. No optimization possible until it's running."
        );
    }

    #[test]
    fn test_low_connections() {
        let record = instance("db-n1-standard-4", "0.5", "0.5", "0.5", "50", "10");
        let recs = run(&record);
        assert_eq!(
            recs[0].message,
            "Low connection count (10) relative to vCPUs (4). Consider reducing vCPUs."
        );
        assert!(recs[0].hint.is_none());
    }

    #[test]
    fn test_very_low_cpu_halves_vcpus() {
        let record = instance("db-custom-4-15360", "0.03", "0.5", "0.5", "50", "500");
        let recs = run(&record);
        let cpu = recs.iter().find(|r| r.kind == RecommendationKind::CpuReduce).unwrap();
        assert_eq!(
            cpu.message,
            "CPU utilization very low (<5%). Current: 4 vCPUs. Recommend reducing to 2 vCPUs."
        );
        assert_eq!(cpu.hint.unwrap().new_value, 2.0);
    }

    #[test]
    fn test_low_cpu_cuts_forty_percent() {
        let record = instance("db-n1-standard-8", "0.1", "0.5", "0.5", "50", "500");
        let recs = run(&record);
        let cpu = recs.iter().find(|r| r.kind == RecommendationKind::CpuReduce).unwrap();
        assert!(cpu.message.contains("Recommend reducing to 4 vCPUs."));
        assert_eq!(cpu.hint.unwrap().dimension, Dimension::Cpu);
    }

    #[test]
    fn test_low_cpu_two_vcpus_only_monitors() {
        let record = instance("db-n1-standard-2", "0.1", "0.5", "0.5", "50", "500");
        let recs = run(&record);
        assert_eq!(kinds(&recs), vec![RecommendationKind::CpuMonitor]);
    }

    #[test]
    fn test_very_low_cpu_single_vcpu_suggests_shared_core() {
        let record = instance("db-custom-1-7680", "0.02", "0.5", "0.5", "50", "500");
        let recs = run(&record);
        assert_eq!(kinds(&recs), vec![RecommendationKind::SharedCoreSwitch]);
    }

    #[test]
    fn test_high_cpu_is_informational() {
        let record = instance("db-n1-standard-2", "0.9", "0.5", "0.5", "50", "500");
        let recs = run(&record);
        assert_eq!(
            recs[0].message,
            "CPU utilization high (>80%). Consider upgrading to 4 vCPUs for better performance."
        );
        assert!(recs[0].hint.is_none());
    }

    #[test]
    fn test_memory_reduction_uses_printed_value() {
        let record = instance("db-custom-4-15360", "0.5", "0.1", "0.5", "50", "500");
        let recs = run(&record);
        let memory = recs.iter().find(|r| r.kind == RecommendationKind::MemoryReduce).unwrap();
        assert_eq!(
            memory.message,
            "Memory utilization low (<30%). Current: 15.0 GB. Recommend reducing to 10.5 GB."
        );
        assert_eq!(memory.hint.unwrap().new_value, 10.5);
    }

    #[test]
    fn test_memory_reduction_respects_floor() {
        // 4.5 GB * 0.7 is below 3.75 GB, so the floor is suggested
        let record = instance("db-custom-2-4608", "0.5", "0.1", "0.5", "50", "500");
        let recs = run(&record);
        let memory = recs.iter().find(|r| r.kind == RecommendationKind::MemoryReduce).unwrap();
        assert!(memory.message.ends_with("Recommend reducing to 3.8 GB."));
        assert_eq!(memory.hint.unwrap().new_value, 3.8);
    }

    #[test]
    fn test_high_memory_is_informational() {
        let record = instance("db-n1-standard-2", "0.5", "0.9", "0.5", "50", "500");
        let recs = run(&record);
        assert_eq!(
            recs[0].message,
            "Memory utilization high (>85%). Consider increasing memory from 7.5 GB to 9.8 GB."
        );
        assert!(recs[0].hint.is_none());
    }

    #[test]
    fn test_disk_rules() {
        let very_low = run(&instance("db-n1-standard-2", "0.5", "0.5", "0.1", "100", "500"));
        assert_eq!(
            very_low[0].message,
            "Disk utilization very low (10.0%) with 100 GB. Consider reducing to 60 GB."
        );
        assert_eq!(very_low[0].hint.unwrap().new_value, 60.0);

        let low = run(&instance("db-n1-standard-2", "0.5", "0.5", "0.3", "500", "500"));
        assert_eq!(
            low[0].message,
            "Disk utilization low (30.0%) with 500 GB. Consider reducing to 350 GB."
        );

        let medium_small_disk = run(&instance("db-n1-standard-2", "0.5", "0.5", "0.3", "100", "500"));
        assert_eq!(kinds(&medium_small_disk), vec![RecommendationKind::RightSized]);

        let high = run(&instance("db-n1-standard-2", "0.5", "0.5", "0.9", "100", "500"));
        assert_eq!(
            high[0].message,
            "Disk utilization high (90.0%). Consider increasing disk size from 100 GB to 130 GB."
        );
        assert!(high[0].hint.is_none());
    }

    #[test]
    fn test_disk_at_floor_not_reduced() {
        let recs = run(&instance("db-n1-standard-2", "0.5", "0.5", "0.05", "10", "500"));
        assert_eq!(kinds(&recs), vec![RecommendationKind::RightSized]);

        // 12 GB * 0.6 rounds under the floor, which is still a reduction
        let recs = run(&instance("db-n1-standard-2", "0.5", "0.5", "0.05", "12", "500"));
        assert_eq!(recs[0].hint.unwrap().new_value, 10.0);
    }

    #[test]
    fn test_never_activated() {
        let mut record = instance("db-n1-standard-2", "0", "0", "0.5", "50", "500");
        record.activation_policy = "NEVER".to_string();
        let recs = run(&record);
        assert!(recs.iter().any(|r| r.kind == RecommendationKind::NeverActivated));
    }

    #[test]
    fn test_unused_instance() {
        let recs = run(&instance("db-n1-standard-2", "0.005", "0.5", "0.5", "50", "0"));
        assert_eq!(
            kinds(&recs),
            vec![
                RecommendationKind::LowConnections,
                RecommendationKind::CpuReduce,
                RecommendationKind::Unused
            ]
        );
    }

    #[test]
    fn test_floor_replaces_reductions_with_consolidation() {
        let recs = run(&instance("db-f1-micro", "0.1", "0.1", "0.1", "100", "10"));
        assert_eq!(kinds(&recs), vec![RecommendationKind::MinimumSpec]);
        assert!(recs
            .iter()
            .all(|r| !r.message.to_lowercase().contains("reduc")));
    }

    #[test]
    fn test_floor_keeps_unused_notice() {
        let recs = run(&instance("db-f1-micro", "0.001", "0.1", "0.5", "10", "0"));
        assert_eq!(kinds(&recs), vec![RecommendationKind::Unused]);
    }

    #[test]
    fn test_appropriately_sized() {
        let recs = run(&instance("db-n1-standard-2", "0.5", "0.5", "0.5", "50", "500"));
        assert_eq!(
            recs[0].message,
            "Instance appears to be appropriately sized based on current utilization."
        );
    }

    #[test]
    fn test_cpu_band_edges() {
        let at_very_low = run(&instance("db-custom-4-15360", "0.05", "0.5", "0.5", "50", "100"));
        assert_eq!(kinds(&at_very_low), vec![RecommendationKind::CpuReduce]);
        assert!(at_very_low[0].message.starts_with("CPU utilization low (<20%)."));
        assert_eq!(at_very_low[0].hint.map(|h| h.new_value), Some(2.0));

        for cpu in ["0.2", "0.8"] {
            let recs = run(&instance("db-custom-4-15360", cpu, "0.5", "0.5", "50", "100"));
            assert_eq!(kinds(&recs), vec![RecommendationKind::RightSized], "cpu_util {}", cpu);
        }
    }

    #[test]
    fn test_memory_at_floor_gets_no_advice() {
        let recs = run(&instance("db-custom-2-3840", "0.5", "0.1", "0.5", "50", "100"));
        assert_eq!(kinds(&recs), vec![RecommendationKind::RightSized]);
    }

    #[test]
    fn test_connection_threshold_edge() {
        let at_threshold = run(&instance("db-custom-2-7680", "0.5", "0.5", "0.5", "50", "40"));
        assert_eq!(kinds(&at_threshold), vec![RecommendationKind::RightSized]);

        let below = run(&instance("db-custom-2-7680", "0.5", "0.5", "0.5", "50", "39"));
        assert_eq!(kinds(&below), vec![RecommendationKind::LowConnections]);
    }
}
