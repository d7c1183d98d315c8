//! Rightsizing library for managed database instances
//!
//! This crate provides the core functionality for:
//! - Decoding machine tiers into vCPU / memory shapes
//! - Regional pricing with version and high-availability modifiers
//! - Utilization-based rightsizing recommendations
//! - Before/after monthly cost estimation
//! - Report assembly, configuration and observability

pub mod error;
pub mod estimator;
pub mod models;
pub mod observability;
pub mod pricing;
pub mod recommender;
pub mod report;
pub mod settings;
pub mod tier;


pub use error::{ConfigError, MetricError, Result, RightsizerError};
pub use estimator::{Allocation, CostEstimator};
pub use models::*;
pub use observability::{RunMetrics, StructuredLogger};
pub use pricing::{PricingTable, RegionPricing, VersionModifier};
pub use recommender::RecommendationEngine;
pub use report::{AnalysisOutcome, InstanceAnalysis, OptimizationReport, ReportBuilder, ReportTotals};
pub use settings::{RightsizerConfig, SizingLimits};
pub use tier::{is_at_minimum_spec, parse_shape, TierParser};
