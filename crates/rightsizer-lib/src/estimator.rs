//! Monthly cost estimation
//!
//! Prices the current shape of an instance, applies the resize hints from
//! its recommendations to get an optimized shape, and prices that too.
//! Optimization only ever lowers cost: an optimized estimate that is not
//! strictly cheaper is clamped to the current one.

use serde::{Deserialize, Serialize};

use crate::error::MetricError;
use crate::models::{
    CostBreakdown, CostLines, Dimension, InstanceRecord, MachineShape, Recommendation,
    RecommendationKind, Savings,
};
use crate::pricing::{PricingTable, RegionPricing};

/// Resources an instance is billed for
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
    pub vcpus: f64,
    pub memory_gb: f64,
    pub disk_gb: f64,
}

impl Allocation {
    pub fn from_shape(shape: &MachineShape, disk_gb: u64) -> Self {
        Self {
            vcpus: shape.vcpus,
            memory_gb: shape.memory_gb(),
            disk_gb: disk_gb as f64,
        }
    }

    /// Apply resize hints in order; a later hint for the same dimension wins
    pub fn with_hints(mut self, recommendations: &[Recommendation]) -> Self {
        for hint in recommendations.iter().filter_map(|r| r.hint) {
            match hint.dimension {
                Dimension::Cpu => self.vcpus = hint.new_value,
                Dimension::Memory => self.memory_gb = hint.new_value,
                Dimension::Disk => self.disk_gb = hint.new_value,
            }
        }
        self
    }
}

/// Multipliers that apply to a single instance
#[derive(Debug, Clone, Copy)]
struct PriceContext<'a> {
    region: &'a RegionPricing,
    hours: f64,
    version_modifier: f64,
    ha_modifier: f64,
}

impl PriceContext<'_> {
    fn monthly(&self, allocation: &Allocation) -> CostLines {
        let compute = self.hours * self.version_modifier * self.ha_modifier;
        let cpu = allocation.vcpus * self.region.cpu_price_per_vcpu_hour * compute;
        let memory = allocation.memory_gb * self.region.memory_price_per_gb_hour * compute;
        let storage = allocation.disk_gb * self.region.storage_price_per_gb_month * self.ha_modifier;
        CostLines {
            cpu,
            memory,
            storage,
            total: cpu + memory + storage,
        }
    }
}

/// Estimates current and optimized monthly cost
#[derive(Debug, Clone, Default)]
pub struct CostEstimator {
    pricing: PricingTable,
}

impl CostEstimator {
    pub fn new(pricing: PricingTable) -> Self {
        Self { pricing }
    }

    pub fn pricing(&self) -> &PricingTable {
        &self.pricing
    }

    /// Current monthly cost of an allocation for an instance's region,
    /// version and availability type, unrounded
    pub fn monthly_cost(&self, instance: &InstanceRecord, allocation: &Allocation) -> CostLines {
        self.context(instance).monthly(allocation)
    }

    /// Build the before/after cost breakdown for one instance
    ///
    /// Fails only when the disk size cannot be parsed.
    pub fn estimate(
        &self,
        instance: &InstanceRecord,
        shape: &MachineShape,
        recommendations: &[Recommendation],
    ) -> Result<CostBreakdown, MetricError> {
        let disk_size_gb = instance.parse_disk_size()?;
        let context = self.context(instance);

        let current_allocation = Allocation::from_shape(shape, disk_size_gb);
        let current = context.monthly(&current_allocation);

        let floored = recommendations
            .iter()
            .any(|r| r.kind == RecommendationKind::MinimumSpec);

        let mut optimized = if floored {
            current
        } else {
            context.monthly(&current_allocation.with_hints(recommendations))
        };
        if optimized.total > current.total {
            optimized = current;
        }

        let mut savings = current.total - optimized.total;
        if floored || savings <= 0.0 {
            savings = 0.0;
            optimized = current;
        }
        let percentage = if current.total > 0.0 {
            savings / current.total * 100.0
        } else {
            0.0
        };

        let savings = Savings {
            monthly: round_cents(savings),
            annual: round_cents(savings * 12.0),
            percentage: round_tenths(percentage),
        };

        Ok(CostBreakdown {
            current: rounded(current),
            optimized: rounded(optimized),
            optimization_possible: savings.monthly > 0.0,
            savings,
        })
    }

    fn context(&self, instance: &InstanceRecord) -> PriceContext<'_> {
        PriceContext {
            region: self.pricing.region(&instance.location),
            hours: self.pricing.hours_per_month,
            version_modifier: self.pricing.version_modifier(&instance.database_version),
            ha_modifier: self
                .pricing
                .availability_modifier(instance.is_high_availability()),
        }
    }
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn round_tenths(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn rounded(lines: CostLines) -> CostLines {
    CostLines {
        cpu: round_cents(lines.cpu),
        memory: round_cents(lines.memory),
        storage: round_cents(lines.storage),
        total: round_cents(lines.total),
    }
}
