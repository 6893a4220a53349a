//! Compile-time embedded Nominatim service configuration.
//!
//! The service is defined in `services/nominatim.toml`. The registry embeds
//! it at compile time and exposes it via [`NominatimConfig::embedded`].
//! Callers that need different endpoints or pacing deserialize their own
//! table into [`NominatimConfig`].

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Nominatim endpoint and pacing configuration loaded from TOML.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NominatimConfig {
    /// Unique identifier (e.g., `"nominatim"`).
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Forward search endpoint.
    pub base_url: String,
    /// Reverse geocoding endpoint.
    pub reverse_url: String,
    /// `User-Agent` header; the public instance rejects anonymous clients.
    pub user_agent: String,
    /// Mandatory delay after every request in milliseconds.
    pub rate_limit_ms: u64,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Country appended to every free-text query.
    pub country: String,
    /// City used when the caller does not name one.
    pub default_city: String,
}

impl NominatimConfig {
    /// Returns the embedded service definition.
    ///
    /// # Panics
    ///
    /// Panics if the embedded TOML is malformed (this is a compile-time
    /// guarantee since the config is embedded).
    #[must_use]
    pub fn embedded() -> Self {
        toml::de::from_str(NOMINATIM_TOML)
            .unwrap_or_else(|e| panic!("Failed to parse geocoding service 'nominatim': {e}"))
    }

    #[must_use]
    pub const fn rate_limit(&self) -> Duration {
        Duration::from_millis(self.rate_limit_ms)
    }

    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for NominatimConfig {
    fn default() -> Self {
        Self::embedded()
    }
}

const NOMINATIM_TOML: &str = include_str!("../services/nominatim.toml");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_embedded_service() {
        let cfg = NominatimConfig::embedded();
        assert_eq!(cfg.id, "nominatim");
        assert!(!cfg.base_url.is_empty());
        assert!(!cfg.reverse_url.is_empty());
        assert!(!cfg.user_agent.is_empty());
    }

    #[test]
    fn respects_public_rate_limit() {
        let cfg = NominatimConfig::embedded();
        assert!(
            cfg.rate_limit() >= Duration::from_secs(1),
            "public Nominatim allows at most 1 req/sec, got {:?}",
            cfg.rate_limit()
        );
        assert_eq!(cfg.timeout(), Duration::from_secs(10));
    }
}
