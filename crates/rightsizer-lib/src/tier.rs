//! Machine tier decoding
//!
//! Turns an opaque tier identifier such as `db-custom-4-15360` or
//! `db-n1-standard-2` into a vCPU / memory shape. Decoding never fails:
//! anything unrecognised falls back to the minimum shape from
//! [`SizingLimits`].

use crate::models::MachineShape;
use crate::settings::SizingLimits;

/// Memory per vCPU for `standard` tiers
pub const STANDARD_MB_PER_VCPU: u32 = 3840;

/// Memory per vCPU for `highmem` tiers
pub const HIGHMEM_MB_PER_VCPU: u32 = 6656;

/// Memory per vCPU for `highcpu` tiers
pub const HIGHCPU_MB_PER_VCPU: u32 = 1024;

/// Shared-core `small` shape (0.5 vCPU, 1.875 GB)
pub const SMALL_SHAPE: MachineShape = MachineShape {
    vcpus: 0.5,
    memory_mb: 1920,
    shared_core: true,
};

/// Shared-core `micro` shape (0.25 vCPU, 0.6 GB)
pub const MICRO_SHAPE: MachineShape = MachineShape {
    vcpus: 0.25,
    memory_mb: 614,
    shared_core: true,
};

/// Decodes tier strings against a set of sizing limits
#[derive(Debug, Clone)]
pub struct TierParser {
    limits: SizingLimits,
}

impl TierParser {
    pub fn new(limits: SizingLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &SizingLimits {
        &self.limits
    }

    /// Decode a tier string into a machine shape
    ///
    /// Families are matched case-insensitively in priority order:
    /// `small`, `micro`, `custom`, `standard`, `highmem`, `highcpu`.
    pub fn parse(&self, tier: &str) -> MachineShape {
        let lowered = tier.to_lowercase();

        if lowered.contains("small") {
            return SMALL_SHAPE;
        }
        if lowered.contains("micro") {
            return MICRO_SHAPE;
        }

        let decoded = if lowered.contains("custom") {
            parse_custom(tier)
        } else if lowered.contains("standard") {
            parse_family(tier, STANDARD_MB_PER_VCPU)
        } else if lowered.contains("highmem") {
            parse_family(tier, HIGHMEM_MB_PER_VCPU)
        } else if lowered.contains("highcpu") {
            parse_family(tier, HIGHCPU_MB_PER_VCPU)
        } else {
            None
        };

        decoded.unwrap_or_else(|| self.fallback_shape())
    }

    /// Shape used for tiers that cannot be decoded
    pub fn fallback_shape(&self) -> MachineShape {
        MachineShape {
            vcpus: self.limits.min_vcpus,
            memory_mb: self.limits.min_memory_mb(),
            shared_core: false,
        }
    }

    /// Whether a shape is already at the sizing floor
    pub fn is_at_minimum(&self, shape: &MachineShape) -> bool {
        shape.shared_core
            || (shape.vcpus <= self.limits.min_vcpus
                && shape.memory_gb() <= self.limits.min_memory_gb)
    }

    /// Whether the tier decodes to a shape at the sizing floor
    pub fn is_at_minimum_spec(&self, tier: &str) -> bool {
        self.is_at_minimum(&self.parse(tier))
    }
}

impl Default for TierParser {
    fn default() -> Self {
        Self::new(SizingLimits::default())
    }
}

/// Decode a tier with the default sizing limits
pub fn parse_shape(tier: &str) -> MachineShape {
    TierParser::default().parse(tier)
}

/// Check a tier against the default sizing floor
pub fn is_at_minimum_spec(tier: &str) -> bool {
    TierParser::default().is_at_minimum_spec(tier)
}

fn parse_count(token: &str) -> Option<u32> {
    token.parse::<u32>().ok().filter(|n| *n > 0)
}

// db-custom-<vcpus>-<memory_mb>
fn parse_custom(tier: &str) -> Option<MachineShape> {
    let mut tokens = tier.rsplit('-');
    let memory_mb = parse_count(tokens.next()?)?;
    let vcpus = parse_count(tokens.next()?)?;
    Some(MachineShape {
        vcpus: f64::from(vcpus),
        memory_mb,
        shared_core: false,
    })
}

// db-<series>-<family>-<vcpus>
fn parse_family(tier: &str, mb_per_vcpu: u32) -> Option<MachineShape> {
    let vcpus = parse_count(tier.rsplit('-').next()?)?;
    let memory_mb = vcpus.checked_mul(mb_per_vcpu)?;
    Some(MachineShape {
        vcpus: f64::from(vcpus),
        memory_mb,
        shared_core: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_custom_tier() {
        let shape = parse_shape("db-custom-4-15360");
        assert_eq!(shape.vcpus, 4.0);
        assert_eq!(shape.memory_mb, 15360);
        assert!(!shape.shared_core);
        assert!((shape.memory_gb() - 15.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_family_tiers() {
        assert_eq!(parse_shape("db-n1-standard-2").memory_mb, 2 * 3840);
        assert_eq!(parse_shape("db-n1-highmem-4").memory_mb, 4 * 6656);
        assert_eq!(parse_shape("db-n1-highcpu-8").memory_mb, 8 * 1024);
        assert_eq!(parse_shape("db-n1-highcpu-8").vcpus, 8.0);
    }

    #[test]
    fn test_shared_core_tiers() {
        assert_eq!(parse_shape("db-g1-small"), SMALL_SHAPE);
        assert_eq!(parse_shape("db-f1-micro"), MICRO_SHAPE);
        assert_eq!(parse_shape("DB-F1-MICRO"), MICRO_SHAPE);
    }

    #[test]
    fn test_small_wins_over_other_families() {
        // "small" is checked before any numeric family
        assert_eq!(parse_shape("db-custom-small-8-30720"), SMALL_SHAPE);
    }

    #[test]
    fn test_case_insensitive_family_match() {
        let shape = parse_shape("DB-N1-STANDARD-4");
        assert_eq!(shape.vcpus, 4.0);
        assert_eq!(shape.memory_mb, 4 * 3840);
    }

    #[test]
    fn test_fallback_on_unknown_or_malformed() {
        let fallback = TierParser::default().fallback_shape();
        assert_eq!(fallback.vcpus, 1.0);
        assert_eq!(fallback.memory_mb, 3840);

        assert_eq!(parse_shape(""), fallback);
        assert_eq!(parse_shape("db-perf-optimized-N-8"), fallback);
        assert_eq!(parse_shape("db-custom-four-15360"), fallback);
        assert_eq!(parse_shape("custom"), fallback);
        assert_eq!(parse_shape("db-n1-standard-x"), fallback);
        assert_eq!(parse_shape("db-custom-0-0"), fallback);
    }

    #[test]
    fn test_at_minimum() {
        assert!(is_at_minimum_spec("db-f1-micro"));
        assert!(is_at_minimum_spec("db-g1-small"));
        assert!(is_at_minimum_spec("db-custom-1-3840"));
        assert!(is_at_minimum_spec("unparseable"));
        assert!(!is_at_minimum_spec("db-custom-1-7680"));
        assert!(!is_at_minimum_spec("db-n1-standard-2"));
    }

    #[test]
    fn test_custom_limits_change_fallback() {
        let parser = TierParser::new(SizingLimits {
            min_vcpus: 2.0,
            min_memory_gb: 7.5,
            min_disk_gb: 10,
        });
        let shape = parser.parse("mystery");
        assert_eq!(shape.vcpus, 2.0);
        assert_eq!(shape.memory_mb, 7680);
        assert!(parser.is_at_minimum_spec("db-n1-standard-2"));
    }
}
