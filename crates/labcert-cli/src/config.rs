//! CLI configuration

use anyhow::{Context, Result};
use labcert_engine::EngineConfig;
use std::path::Path;
use tracing::{debug, warn};

/// Load engine configuration from a TOML file.
///
/// No path, or a path that does not exist, yields the defaults.
pub fn load(path: Option<&str>) -> Result<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    let config_path = Path::new(path);
    if !config_path.exists() {
        warn!(path, "config file not found, using defaults");
        return Ok(EngineConfig::default());
    }

    let contents = std::fs::read_to_string(config_path)
        .with_context(|| format!("reading config {}", path))?;
    let config: EngineConfig =
        toml::from_str(&contents).with_context(|| format!("parsing config {}", path))?;
    config.validate()?;
    debug!(path, company = %config.company.name, "config loaded");
    Ok(config)
}
