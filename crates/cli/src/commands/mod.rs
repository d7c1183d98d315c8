//! Subcommand implementations

pub mod analyze;
pub mod pricing;
pub mod table;
