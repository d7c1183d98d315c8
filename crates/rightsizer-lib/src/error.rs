//! Error types for the rightsizer
//!
//! Library code returns `crate::error::Result<T>`. The CLI converts into
//! `anyhow::Error` at its boundary.
//!
//! - `MetricError`: a numeric inventory field could not be parsed. Always
//!   recoverable per instance; the batch continues.
//! - `ConfigError`: configuration could not be loaded or failed validation.
//!   Fatal at the CLI boundary.

use std::num::{ParseFloatError, ParseIntError};
use thiserror::Error;

/// Main error type for the rightsizer library
#[derive(Error, Debug)]
pub enum RightsizerError {
    #[error("Metric error: {0}")]
    Metric(#[from] MetricError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// A numeric field of an inventory record failed to parse
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MetricError {
    #[error("could not convert {field} value '{value}' to a number: {source}")]
    InvalidFloat {
        field: &'static str,
        value: String,
        #[source]
        source: ParseFloatError,
    },

    #[error("could not convert {field} value '{value}' to an integer: {source}")]
    InvalidInteger {
        field: &'static str,
        value: String,
        #[source]
        source: ParseIntError,
    },
}

impl MetricError {
    /// Name of the field that failed to parse
    pub fn field(&self) -> &'static str {
        match self {
            MetricError::InvalidFloat { field, .. } | MetricError::InvalidInteger { field, .. } => {
                field
            }
        }
    }
}

/// Configuration loading and validation errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid value for {key}: {message}")]
    Invalid { key: String, message: String },
}

pub type Result<T> = std::result::Result<T, RightsizerError>;
