//! CLI command implementations

pub mod decode;
pub mod simulate;

use anyhow::{Context, Result};
use sigil_core::SimConfig;
use std::path::Path;

/// Load the config file if one was given, else defaults with env overrides
pub fn load_config(path: Option<&str>) -> Result<SimConfig> {
    match path {
        Some(path) => SimConfig::load(Path::new(path))
            .with_context(|| format!("Failed to load config: {}", path)),
        None => {
            let mut config = SimConfig::default();
            config.apply_env_overrides();
            Ok(config)
        }
    }
}
