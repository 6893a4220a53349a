//! Compile-time embedded cadastre service configuration.
//!
//! Defined in `services/catastro.toml` and embedded at compile time.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Cadastre (OVC) endpoints, retry policy, and scan pacing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatastroConfig {
    /// Unique identifier (e.g., `"catastro"`).
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Point query endpoint (`Consulta_CPMRC`).
    pub coordinates_url: String,
    /// Cadastral reference endpoint (`Consulta_DNPRC`).
    pub reference_url: String,
    /// Spatial reference system identifier sent with point queries.
    pub srs: String,
    pub user_agent: String,
    /// Total attempts per coordinate lookup (1 = no retry).
    pub max_attempts: u32,
    /// Base backoff delay in milliseconds, doubled after every failed
    /// attempt.
    pub retry_delay_ms: u64,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Delay between consecutive point queries of an area scan.
    pub pacing_ms: u64,
}

impl CatastroConfig {
    /// Returns the embedded service definition.
    ///
    /// # Panics
    ///
    /// Panics if the embedded TOML is malformed (this is a compile-time
    /// guarantee since the config is embedded).
    #[must_use]
    pub fn embedded() -> Self {
        toml::de::from_str(CATASTRO_TOML)
            .unwrap_or_else(|e| panic!("Failed to parse cadastre service 'catastro': {e}"))
    }

    #[must_use]
    pub const fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    #[must_use]
    pub const fn pacing(&self) -> Duration {
        Duration::from_millis(self.pacing_ms)
    }
}

impl Default for CatastroConfig {
    fn default() -> Self {
        Self::embedded()
    }
}

const CATASTRO_TOML: &str = include_str!("../services/catastro.toml");
