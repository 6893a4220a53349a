#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Spanish cadastre (Oficina Virtual del Catastro) client.
//!
//! Resolves a WGS84 point, or a cadastral reference, to at most one
//! [`ParcelRecord`]. The service only answers point queries; area coverage
//! is built on top of this by the zone sampler.
//!
//! Outcomes at the [`ParcelLookup`] boundary are binary: a parcel, or
//! `None`. Internally three failure kinds are distinguished:
//!
//! - **no parcel** (error node or missing parcel node): never retried.
//! - **malformed** (unparseable body): never retried, reported as no
//!   parcel.
//! - **transient** (network error, timeout, HTTP 429/5xx): retried with
//!   exponential backoff by coordinate lookups only.

pub mod parse;
pub mod retry;
pub mod service_registry;
pub mod transport;
pub mod xml;

use async_trait::async_trait;
use thiserror::Error;
use zone_radar_zones_models::{Coordinate, ParcelRecord};

pub use service_registry::CatastroConfig;
pub use transport::{CadastreTransport, HttpTransport};

/// Errors from cadastre requests.
#[derive(Debug, Error)]
pub enum CadastreError {
    /// Network failure or timeout.
    #[error("Transport error: {message}")]
    Transport {
        /// Description of the failure.
        message: String,
    },

    /// Non-success HTTP status.
    #[error("HTTP status {status}")]
    Status {
        /// Status code returned by the server.
        status: u16,
    },

    /// Response body could not be parsed.
    #[error("Malformed response: {message}")]
    Malformed {
        /// Description of the parsing failure.
        message: String,
    },
}

impl CadastreError {
    /// Whether retrying the same request may succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::Transport { .. } => true,
            Self::Status { status } => *status == 429 || *status >= 500,
            Self::Malformed { .. } => false,
        }
    }
}

impl From<reqwest::Error> for CadastreError {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport {
            message: e.to_string(),
        }
    }
}

/// Resolves points and references to cadastral parcels.
#[async_trait]
pub trait ParcelLookup: Send + Sync {
    /// Parcel containing `coordinate`, retrying transient failures.
    async fn lookup_by_coordinate(&self, coordinate: Coordinate) -> Option<ParcelRecord>;

    /// Parcel with the given cadastral reference. Single attempt.
    async fn lookup_by_reference(&self, reference: &str) -> Option<ParcelRecord>;
}

/// [`ParcelLookup`] backed by the OVC web services.
pub struct CatastroClient<T: CadastreTransport = HttpTransport> {
    transport: T,
    config: CatastroConfig,
}

impl CatastroClient<HttpTransport> {
    /// Builds a client over HTTP using the configured `User-Agent` and
    /// timeout.
    ///
    /// # Errors
    ///
    /// Returns [`CadastreError::Transport`] if the HTTP client cannot be
    /// built.
    pub fn new(config: CatastroConfig) -> Result<Self, CadastreError> {
        let transport = HttpTransport::new(&config.user_agent, config.timeout())?;
        Ok(Self::with_transport(transport, config))
    }
}

impl<T: CadastreTransport> CatastroClient<T> {
    pub const fn with_transport(transport: T, config: CatastroConfig) -> Self {
        Self { transport, config }
    }

    #[must_use]
    pub const fn config(&self) -> &CatastroConfig {
        &self.config
    }

    async fn query_coordinate(
        &self,
        coordinate: Coordinate,
        params: &[(&str, String)],
    ) -> Result<Option<ParcelRecord>, CadastreError> {
        let body = self
            .transport
            .get(&self.config.coordinates_url, params)
            .await?;
        parse::parse_coordinate_response(&body, coordinate)
    }
}

#[async_trait]
impl<T: CadastreTransport> ParcelLookup for CatastroClient<T> {
    async fn lookup_by_coordinate(&self, coordinate: Coordinate) -> Option<ParcelRecord> {
        // X is longitude, Y is latitude.
        let params = [
            ("SRS", self.config.srs.clone()),
            ("Coordenada_X", coordinate.longitude.to_string()),
            ("Coordenada_Y", coordinate.latitude.to_string()),
        ];
        let params = &params;

        let result = retry::with_backoff(
            self.config.max_attempts,
            self.config.retry_delay(),
            |attempt| {
                log::debug!(
                    "Querying cadastre at ({coordinate}) (attempt {})",
                    attempt + 1
                );
                self.query_coordinate(coordinate, params)
            },
        )
        .await;

        match result {
            Ok(Some(parcel)) => {
                log::debug!(
                    "Parcel found: {} ({})",
                    parcel.address.as_deref().unwrap_or("no address"),
                    parcel
                        .construction_year
                        .map_or_else(|| "year unknown".to_string(), |y| y.to_string())
                );
                Some(parcel)
            }
            Ok(None) => {
                log::debug!("No parcel at ({coordinate})");
                None
            }
            Err(e) => {
                log::warn!("Cadastre lookup at ({coordinate}) gave up: {e}");
                None
            }
        }
    }

    async fn lookup_by_reference(&self, reference: &str) -> Option<ParcelRecord> {
        let params = [
            ("Provincia", String::new()),
            ("Municipio", String::new()),
            ("RC", reference.to_string()),
        ];

        log::info!("Querying cadastre by reference: {reference}");
        let result = match self.transport.get(&self.config.reference_url, &params).await {
            Ok(body) => parse::parse_reference_response(&body),
            Err(e) => Err(e),
        };

        match result {
            Ok(parcel) => parcel,
            Err(e) => {
                log::warn!("Cadastre reference lookup for {reference} failed: {e}");
                None
            }
        }
    }
}
