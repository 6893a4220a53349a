#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Geocoding for zone analysis.
//!
//! Resolves seed addresses, street names, neighborhood names, and postal
//! codes to coordinates using Nominatim / `OpenStreetMap`. The public
//! instance allows **1 request per second**; [`NominatimGeocoder`] pays a
//! fixed delay after every call, whatever the outcome.
//!
//! Every failure (transport error, HTTP status, unparseable body, empty
//! result) surfaces through [`GeoLookup`] as `None`. Nothing is retried
//! here; retry policy belongs to the caller.

pub mod nominatim;
pub mod service_registry;
pub mod transport;

use async_trait::async_trait;
use thiserror::Error;
use zone_radar_zones_models::{Coordinate, GeoMatch, ZoneBounds};

pub use service_registry::NominatimConfig;
pub use transport::{GeocodeTransport, HttpTransport};

/// Country appended to queries when an implementation does not say
/// otherwise.
pub const DEFAULT_COUNTRY: &str = "España";

/// Errors from geocoding operations.
#[derive(Debug, Error)]
pub enum GeocodeError {
    /// HTTP request failed (includes timeouts).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success HTTP status.
    #[error("HTTP status {status}")]
    Status {
        /// Status code returned by the server.
        status: u16,
    },

    /// Response parsing failed.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of the parsing failure.
        message: String,
    },

    /// Rate limit exceeded.
    #[error("Rate limit exceeded")]
    RateLimited,
}

/// Resolves free text to coordinates and areas.
///
/// Implementations block the caller for the duration of the external call
/// plus any mandatory pacing.
#[async_trait]
pub trait GeoLookup: Send + Sync {
    /// Single best match for `"{query}, {city}, {country}"`.
    async fn resolve_address(&self, query: &str, city: &str, country: &str) -> Option<GeoMatch>;

    /// Center, bounding box, and approximate area of a named place.
    ///
    /// Matches without a usable bounding box are `None`.
    async fn resolve_zone_bounds(&self, name: &str, city: &str) -> Option<ZoneBounds>;

    /// Display name of the place at `coordinate`.
    async fn resolve_coordinate(&self, coordinate: Coordinate) -> Option<String>;

    /// Country used by [`GeoLookup::resolve_multiple`].
    fn default_country(&self) -> &str {
        DEFAULT_COUNTRY
    }

    /// Resolves each query in order, silently dropping the ones that fail.
    ///
    /// The output may be shorter than the input; positions do not
    /// correspond.
    async fn resolve_multiple(&self, queries: &[String], city: &str) -> Vec<GeoMatch> {
        let country = self.default_country().to_string();
        let mut resolved = Vec::with_capacity(queries.len());

        for query in queries {
            match self.resolve_address(query, city, &country).await {
                Some(hit) => resolved.push(hit),
                None => log::warn!("Could not geocode: {query}"),
            }
        }

        log::info!(
            "Geocoded {} of {} addresses",
            resolved.len(),
            queries.len()
        );
        resolved
    }
}

/// [`GeoLookup`] backed by a Nominatim instance.
///
/// Every request, successful or not, is followed by the configured
/// `rate_limit_ms` delay.
pub struct NominatimGeocoder<T: GeocodeTransport = HttpTransport> {
    transport: T,
    config: NominatimConfig,
}

impl NominatimGeocoder<HttpTransport> {
    /// Builds a client with the configured `User-Agent` and timeout.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::Http`] if the HTTP client cannot be built.
    pub fn new(config: NominatimConfig) -> Result<Self, GeocodeError> {
        let transport = HttpTransport::new(&config.user_agent, config.timeout())?;
        Ok(Self::with_transport(transport, config))
    }
}

impl<T: GeocodeTransport> NominatimGeocoder<T> {
    pub const fn with_transport(transport: T, config: NominatimConfig) -> Self {
        Self { transport, config }
    }

    #[must_use]
    pub const fn config(&self) -> &NominatimConfig {
        &self.config
    }

    async fn search_paced(&self, query: &str) -> Result<Option<GeoMatch>, GeocodeError> {
        log::info!("Geocoding: {query}");
        let result = nominatim::search(&self.transport, &self.config.base_url, query).await;
        tokio::time::sleep(self.config.rate_limit()).await;
        result
    }
}

#[async_trait]
impl<T: GeocodeTransport> GeoLookup for NominatimGeocoder<T> {
    async fn resolve_address(&self, query: &str, city: &str, country: &str) -> Option<GeoMatch> {
        let full = format!("{query}, {city}, {country}");
        match self.search_paced(&full).await {
            Ok(Some(hit)) => {
                log::info!("Geocoded: {query} -> ({})", hit.coordinate);
                Some(hit)
            }
            Ok(None) => {
                log::warn!("No results for: {full}");
                None
            }
            Err(e) => {
                log::warn!("Geocoding failed for {full}: {e}");
                None
            }
        }
    }

    async fn resolve_zone_bounds(&self, name: &str, city: &str) -> Option<ZoneBounds> {
        let full = format!("{name}, {city}, {}", self.config.country);
        let hit = match self.search_paced(&full).await {
            Ok(Some(hit)) => hit,
            Ok(None) => {
                log::warn!("Zone not found: {full}");
                return None;
            }
            Err(e) => {
                log::warn!("Zone geocoding failed for {full}: {e}");
                return None;
            }
        };

        let Some(bbox) = hit.bounding_box else {
            log::warn!("Invalid bounding box for zone: {name}");
            return None;
        };

        let bounds = ZoneBounds::from_bounding_box(bbox, hit.display_name);
        log::info!(
            "Zone geocoded: {name} -> center ({}), area {:.2} km²",
            bounds.center,
            bounds.area_km2
        );
        Some(bounds)
    }

    async fn resolve_coordinate(&self, coordinate: Coordinate) -> Option<String> {
        let result =
            nominatim::reverse(&self.transport, &self.config.reverse_url, coordinate).await;
        tokio::time::sleep(self.config.rate_limit()).await;

        match result {
            Ok(name) => name,
            Err(e) => {
                log::warn!("Reverse geocoding failed for ({coordinate}): {e}");
                None
            }
        }
    }

    fn default_country(&self) -> &str {
        &self.config.country
    }
}
