//! Runtime settings: the embedded service definitions and scoring
//! defaults, optionally overridden by a user TOML file.
//!
//! The override file may contain any subset of the `[geocoder]`,
//! `[cadastre]`, and `[scoring]` tables; keys it does not mention keep
//! their embedded values.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use zone_radar_cadastre::CatastroConfig;
use zone_radar_geocoder::NominatimConfig;
use zone_radar_zones::ScoringConfig;

/// Errors from loading the settings file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config file: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Failed to encode default settings: {0}")]
    Encode(#[from] toml::ser::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub geocoder: NominatimConfig,
    pub cadastre: CatastroConfig,
    pub scoring: ScoringConfig,
}

impl Settings {
    #[must_use]
    pub fn embedded() -> Self {
        Self {
            geocoder: NominatimConfig::embedded(),
            cadastre: CatastroConfig::embedded(),
            scoring: ScoringConfig::default(),
        }
    }

    /// Embedded settings, overridden by `path` when given.
    ///
    /// # Errors
    ///
    /// * If the file cannot be read
    /// * If the file is not valid TOML or has values of the wrong type
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::embedded());
        };
        log::info!("Loading settings from {}", path.display());
        let contents = std::fs::read_to_string(path)?;
        Self::from_overrides(&contents)
    }

    /// Embedded settings with the tables in `overrides` merged on top.
    ///
    /// # Errors
    ///
    /// * If `overrides` is not valid TOML or has values of the wrong type
    pub fn from_overrides(overrides: &str) -> Result<Self, ConfigError> {
        let overlay: toml::Table = toml::from_str(overrides)?;
        let mut merged = toml::Value::try_from(Self::embedded())?;
        merge(&mut merged, toml::Value::Table(overlay));
        Ok(merged.try_into()?)
    }
}

/// Recursively overlays tables; any non-table value replaces the base.
fn merge(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base), toml::Value::Table(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}
