//! Regional pricing table
//!
//! Unit prices per region, database-version premiums and the
//! high-availability multiplier. Passed explicitly to the cost estimator so
//! tests can use synthetic tables.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::ConfigError;

/// Hours billed per month
pub const HOURS_PER_MONTH: f64 = 730.0;

/// Multiplier applied to every cost line of a regional (HA) instance
pub const HA_MULTIPLIER: f64 = 2.0;

/// Unit prices for one region (USD)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegionPricing {
    pub cpu_price_per_vcpu_hour: f64,
    pub memory_price_per_gb_hour: f64,
    pub storage_price_per_gb_month: f64,
}

impl RegionPricing {
    pub const fn new(cpu: f64, memory: f64, storage: f64) -> Self {
        Self {
            cpu_price_per_vcpu_hour: cpu,
            memory_price_per_gb_hour: memory,
            storage_price_per_gb_month: storage,
        }
    }
}

/// Price multiplier for database versions containing `pattern`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionModifier {
    pub pattern: String,
    pub multiplier: f64,
}

const DEFAULT_REGIONS: &[(&str, RegionPricing)] = &[
    ("us-central1", RegionPricing::new(0.0413, 0.007, 0.17)),
    ("us-east1", RegionPricing::new(0.0386, 0.0065, 0.17)),
    ("us-east4", RegionPricing::new(0.0458, 0.0077, 0.17)),
    ("us-west1", RegionPricing::new(0.0413, 0.007, 0.17)),
    ("us-west2", RegionPricing::new(0.0495, 0.0084, 0.17)),
    ("us-west3", RegionPricing::new(0.0495, 0.0084, 0.17)),
    ("us-west4", RegionPricing::new(0.0495, 0.0084, 0.17)),
    ("europe-west1", RegionPricing::new(0.0454, 0.0077, 0.17)),
    ("europe-west2", RegionPricing::new(0.0541, 0.0092, 0.17)),
    ("europe-west3", RegionPricing::new(0.0541, 0.0092, 0.17)),
    ("europe-west4", RegionPricing::new(0.0454, 0.0077, 0.17)),
    ("europe-west6", RegionPricing::new(0.0588, 0.01, 0.17)),
    ("europe-north1", RegionPricing::new(0.0454, 0.0077, 0.17)),
    ("asia-east1", RegionPricing::new(0.0503, 0.0085, 0.17)),
    ("asia-east2", RegionPricing::new(0.0588, 0.01, 0.17)),
    ("asia-northeast1", RegionPricing::new(0.0495, 0.0084, 0.17)),
    ("asia-northeast2", RegionPricing::new(0.0495, 0.0084, 0.17)),
    ("asia-northeast3", RegionPricing::new(0.0495, 0.0084, 0.17)),
    ("asia-southeast1", RegionPricing::new(0.0495, 0.0084, 0.17)),
    ("asia-south1", RegionPricing::new(0.0495, 0.0084, 0.17)),
    ("australia-southeast1", RegionPricing::new(0.0536, 0.0091, 0.17)),
];

const DEFAULT_REGION_PRICING: RegionPricing = RegionPricing::new(0.0495, 0.0084, 0.17);

const DEFAULT_VERSION_MODIFIERS: &[(&str, f64)] = &[
    ("MYSQL_8_0", 1.0),
    ("POSTGRES_13", 1.0),
    ("SQLSERVER_2019_STANDARD", 1.25),
    ("SQLSERVER_2019_ENTERPRISE", 2.0),
];

/// Pricing lookup data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingTable {
    /// Known regions
    pub regions: BTreeMap<String, RegionPricing>,
    /// Entry used for regions not in `regions`
    pub default_region: RegionPricing,
    /// Checked in order; the first pattern contained in the version wins
    pub version_modifiers: Vec<VersionModifier>,
    /// Multiplier for versions matching no pattern
    pub default_version_modifier: f64,
    pub ha_multiplier: f64,
    pub hours_per_month: f64,
}

impl Default for PricingTable {
    fn default() -> Self {
        Self {
            regions: DEFAULT_REGIONS
                .iter()
                .map(|(name, pricing)| (name.to_string(), *pricing))
                .collect(),
            default_region: DEFAULT_REGION_PRICING,
            version_modifiers: DEFAULT_VERSION_MODIFIERS
                .iter()
                .map(|(pattern, multiplier)| VersionModifier {
                    pattern: pattern.to_string(),
                    multiplier: *multiplier,
                })
                .collect(),
            default_version_modifier: 1.0,
            ha_multiplier: HA_MULTIPLIER,
            hours_per_month: HOURS_PER_MONTH,
        }
    }
}

impl PricingTable {
    /// Prices for a region, falling back to the default entry
    pub fn region(&self, region: &str) -> &RegionPricing {
        self.regions.get(region).unwrap_or(&self.default_region)
    }

    pub fn is_known_region(&self, region: &str) -> bool {
        self.regions.contains_key(region)
    }

    /// Premium multiplier for a database version string
    pub fn version_modifier(&self, database_version: &str) -> f64 {
        self.version_modifiers
            .iter()
            .find(|m| database_version.contains(m.pattern.as_str()))
            .map(|m| m.multiplier)
            .unwrap_or(self.default_version_modifier)
    }

    pub fn availability_modifier(&self, high_availability: bool) -> f64 {
        if high_availability {
            self.ha_multiplier
        } else {
            1.0
        }
    }

    /// Reject negative prices and non-positive multipliers
    pub fn validate(&self) -> Result<(), ConfigError> {
        let entries = self
            .regions
            .iter()
            .map(|(name, pricing)| (name.as_str(), pricing))
            .chain(std::iter::once(("default_region", &self.default_region)));

        for (name, pricing) in entries {
            let prices = [
                ("cpu_price_per_vcpu_hour", pricing.cpu_price_per_vcpu_hour),
                ("memory_price_per_gb_hour", pricing.memory_price_per_gb_hour),
                ("storage_price_per_gb_month", pricing.storage_price_per_gb_month),
            ];
            for (field, value) in prices {
                if !value.is_finite() || value < 0.0 {
                    return Err(invalid(
                        format!("pricing.regions.{}.{}", name, field),
                        format!("price must be non-negative, got {}", value),
                    ));
                }
            }
        }

        for modifier in &self.version_modifiers {
            if !is_positive(modifier.multiplier) {
                return Err(invalid(
                    format!("pricing.version_modifiers.{}", modifier.pattern),
                    format!("multiplier must be positive, got {}", modifier.multiplier),
                ));
            }
        }

        let scalars = [
            ("pricing.default_version_modifier", self.default_version_modifier),
            ("pricing.ha_multiplier", self.ha_multiplier),
            ("pricing.hours_per_month", self.hours_per_month),
        ];
        for (key, value) in scalars {
            if !is_positive(value) {
                return Err(invalid(key.to_string(), format!("must be positive, got {}", value)));
            }
        }

        Ok(())
    }
}

fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

fn invalid(key: String, message: String) -> ConfigError {
    ConfigError::Invalid { key, message }
}
