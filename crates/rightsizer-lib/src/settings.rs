//! Rightsizer configuration
//!
//! Layers, lowest precedence first: compiled-in defaults, an optional
//! config file (format picked from its extension), then environment
//! variables such as `CSR_LIMITS__MIN_DISK_GB=20`.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use crate::error::{ConfigError, Result};
use crate::pricing::PricingTable;

/// Environment variable prefix for overrides
pub const ENV_PREFIX: &str = "CSR";

/// Minimum vCPUs for a dedicated-core instance
pub const MIN_VCPUS: f64 = 1.0;

/// Minimum memory in GB for a dedicated-core instance
pub const MIN_MEMORY_GB: f64 = 3.75;

/// Minimum disk size in GB
pub const MIN_DISK_SIZE_GB: u64 = 10;

/// Smallest vCPU allocation any tier can have
pub const SHARED_CORE_FLOOR_VCPUS: f64 = 0.25;

/// Floor below which no reduction is recommended
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SizingLimits {
    pub min_vcpus: f64,
    pub min_memory_gb: f64,
    pub min_disk_gb: u64,
}

impl Default for SizingLimits {
    fn default() -> Self {
        Self {
            min_vcpus: MIN_VCPUS,
            min_memory_gb: MIN_MEMORY_GB,
            min_disk_gb: MIN_DISK_SIZE_GB,
        }
    }
}

impl SizingLimits {
    pub fn min_memory_mb(&self) -> u32 {
        (self.min_memory_gb * 1024.0) as u32
    }

    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if !self.min_vcpus.is_finite() || self.min_vcpus < SHARED_CORE_FLOOR_VCPUS {
            return Err(ConfigError::Invalid {
                key: "limits.min_vcpus".to_string(),
                message: format!(
                    "must be at least {}, got {}",
                    SHARED_CORE_FLOOR_VCPUS, self.min_vcpus
                ),
            });
        }
        if !self.min_memory_gb.is_finite() || self.min_memory_gb <= 0.0 {
            return Err(ConfigError::Invalid {
                key: "limits.min_memory_gb".to_string(),
                message: format!("must be positive, got {}", self.min_memory_gb),
            });
        }
        Ok(())
    }
}

/// Full rightsizer configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RightsizerConfig {
    pub pricing: PricingTable,
    pub limits: SizingLimits,
}

impl RightsizerConfig {
    /// Load configuration from defaults, an optional file and `CSR_*` variables
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_prefix(path, ENV_PREFIX)
    }

    /// Load configuration using a custom environment prefix
    pub fn load_with_prefix(path: Option<&Path>, env_prefix: &str) -> Result<Self> {
        let defaults = config::Config::try_from(&RightsizerConfig::default())
            .map_err(ConfigError::from)?;

        let mut builder = config::Config::builder().add_source(defaults);
        if let Some(path) = path {
            debug!(path = %path.display(), "Loading configuration file");
            builder = builder.add_source(config::File::from(path).required(true));
        }
        builder = builder.add_source(
            config::Environment::with_prefix(env_prefix)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let loaded: RightsizerConfig = builder
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(ConfigError::from)?;

        loaded.validate()?;
        Ok(loaded)
    }

    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        self.pricing.validate()?;
        self.limits.validate()
    }
}
