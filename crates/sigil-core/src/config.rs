//! Simulation configuration
//!
//! Loaded from a TOML file; every key is optional and falls back to the
//! defaults below. Environment variable `SIGIL_SEED` overrides the RNG seed.

use crate::error::{Result, SigilError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Settings shared by the decoder, the particle VM and the sequencer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Simulation frames per real-time second
    pub frame_rate: f32,
    /// Playback rate a new sequence starts with
    pub playback_rate: f32,
    /// Hard cap on live particles in one generator
    pub max_particles_per_generator: usize,
    /// Nesting limit for child routines and particle child generators
    pub max_nesting_depth: u8,
    /// Distance from the observer at which sun and moon anchors are placed
    pub sky_distance: f32,
    /// In-game minutes that pass per simulation frame
    pub game_minutes_per_frame: f32,
    /// Resource directories whose routines are treated as auto-run
    pub auto_play_locations: Vec<String>,
    /// Seed for the shared effect RNG
    pub rng_seed: u32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            frame_rate: 60.0,
            playback_rate: 1.0,
            max_particles_per_generator: 4096,
            max_nesting_depth: 8,
            sky_distance: 500.0,
            game_minutes_per_frame: 1.0 / 60.0,
            auto_play_locations: vec!["idle".to_string(), "amb".to_string(), "wthr".to_string()],
            rng_seed: 0x5EED_0001,
        }
    }
}

impl SimConfig {
    /// Parse a config from TOML source
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: SimConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config file, then apply environment overrides
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::from_toml_str(&content)?;
        config.apply_env_overrides();
        Ok(config)
    }

    pub fn apply_env_overrides(&mut self) {
        if let Ok(seed) = std::env::var("SIGIL_SEED") {
            if let Ok(parsed) = seed.parse::<u32>() {
                self.rng_seed = parsed;
            }
        }
    }

    fn validate(&self) -> Result<()> {
        if self.frame_rate <= 0.0 {
            return Err(SigilError::ConfigError(format!(
                "frame_rate must be positive, got {}",
                self.frame_rate
            )));
        }
        if self.playback_rate < 0.0 {
            return Err(SigilError::ConfigError(format!(
                "playback_rate must not be negative, got {}",
                self.playback_rate
            )));
        }
        if self.max_nesting_depth == 0 {
            return Err(SigilError::ConfigError(
                "max_nesting_depth must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Whether routines found under this directory name should loop on their own
    pub fn is_auto_play_location(&self, name: &str) -> bool {
        self.auto_play_locations.iter().any(|loc| loc == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_sane() {
        let config = SimConfig::default();
        assert!(config.frame_rate > 0.0);
        assert!((config.playback_rate - 1.0).abs() < 1e-6);
        assert!(config.max_nesting_depth > 0);
        assert!(config.is_auto_play_location("idle"));
        assert!(!config.is_auto_play_location("spel"));
    }

    #[test]
    fn parse_partial_toml() {
        let config = SimConfig::from_toml_str(
            r#"
frame_rate = 30.0
auto_play_locations = ["loop"]
"#,
        )
        .unwrap();
        assert!((config.frame_rate - 30.0).abs() < 1e-6);
        assert!(config.is_auto_play_location("loop"));
        assert!(!config.is_auto_play_location("idle"));
        // Untouched keys keep defaults
        assert_eq!(config.max_nesting_depth, 8);
    }

    #[test]
    fn reject_invalid_values() {
        let err = SimConfig::from_toml_str("frame_rate = 0.0").unwrap_err();
        assert!(matches!(err, SigilError::ConfigError(_)));
        let err = SimConfig::from_toml_str("frame_rate = \"fast\"").unwrap_err();
        assert!(matches!(err, SigilError::TomlParseError(_)));
    }
}
