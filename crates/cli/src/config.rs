//! Configuration file resolution for the CLI

use anyhow::{Context, Result};
use rightsizer_lib::RightsizerConfig;
use std::path::PathBuf;
use tracing::debug;

/// Load the rightsizer configuration
///
/// An explicit path must exist. Without one, `~/.config/csr/config.toml`
/// is used when present; otherwise only defaults and `CSR_*` variables apply.
pub fn load_config(override_path: Option<&str>) -> Result<RightsizerConfig> {
    let path = config_path(override_path);
    debug!(path = ?path, "Resolved configuration file");
    RightsizerConfig::load(path.as_deref()).context("Failed to load configuration")
}

/// Get the configuration file path, if any
fn config_path(override_path: Option<&str>) -> Option<PathBuf> {
    if let Some(path) = override_path {
        return Some(PathBuf::from(path));
    }

    let default = default_config_path()?;
    default.exists().then_some(default)
}

fn default_config_path() -> Option<PathBuf> {
    dirs_next::home_dir().map(|home| home.join(".config").join("csr").join("config.toml"))
}

