//! End-to-end zone analyses: resolve the input, sample the area, filter,
//! classify, and aggregate.

use std::collections::BTreeSet;
use std::time::Duration;

use zone_radar_cadastre::ParcelLookup;
use zone_radar_geocoder::GeoLookup;
use zone_radar_zones_models::{Coordinate, ParcelRecord, Zone, ZoneBounds};

use crate::aggregate::aggregate;
use crate::classify::BuildingClassifier;
use crate::progress::ScanEventSender;
use crate::sampler::{AreaSampler, DEFAULT_GRID_SIZE};

/// Radius around each seed address when none is given.
pub const DEFAULT_RADIUS_METERS: u32 = 500;
/// Grid size for named-area scans, which usually cover more ground.
pub const ZONE_GRID_SIZE: u32 = 7;
/// Name of the zone returned when no seed address resolves.
pub const NO_DATA_ZONE_NAME: &str = "Zone without data";

/// Sampling knobs shared by every entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanOptions {
    pub grid_size: u32,
    /// Drop parcels whose usage is not residential before classifying.
    pub residential_only: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            grid_size: DEFAULT_GRID_SIZE,
            residential_only: true,
        }
    }
}

/// A zone plus how much of the input could be resolved.
///
/// `resolved_inputs == 0` means the analysis could not start; a resolved
/// input with an empty zone means nothing was found.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisReport {
    pub zone: Zone,
    pub requested_inputs: usize,
    pub resolved_inputs: usize,
}

impl AnalysisReport {
    #[must_use]
    pub const fn is_unresolved(&self) -> bool {
        self.resolved_inputs == 0
    }

    fn unresolved(zone: Zone, requested_inputs: usize) -> Self {
        Self {
            zone,
            requested_inputs,
            resolved_inputs: 0,
        }
    }
}

/// Runs zone analyses against a geocoder and a parcel lookup.
///
/// One sampler serves every analysis, so cadastre pacing holds across
/// seeds and across consecutive zones.
pub struct ZoneAnalyzer<'a> {
    geocoder: &'a dyn GeoLookup,
    sampler: AreaSampler<'a>,
    classifier: BuildingClassifier,
}

impl<'a> ZoneAnalyzer<'a> {
    /// No pacing and no progress events until configured.
    #[must_use]
    pub const fn new(
        geocoder: &'a dyn GeoLookup,
        parcels: &'a dyn ParcelLookup,
        classifier: BuildingClassifier,
    ) -> Self {
        Self {
            geocoder,
            sampler: AreaSampler::new(parcels, Duration::ZERO),
            classifier,
        }
    }

    /// Delay between consecutive parcel lookups.
    #[must_use]
    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.sampler = self.sampler.with_pacing(pacing);
        self
    }

    #[must_use]
    pub fn with_events(mut self, events: ScanEventSender) -> Self {
        self.sampler = self.sampler.with_events(Some(events));
        self
    }

    #[must_use]
    pub const fn classifier(&self) -> &BuildingClassifier {
        &self.classifier
    }

    /// Analyzes the area around a set of seed addresses.
    ///
    /// Every resolved seed is sampled with the given radius; parcels are
    /// merged across seeds by reference, first occurrence winning. The
    /// zone is centered on the mean of the resolved seeds and named after
    /// the city. If no seed resolves, the result is an empty zone named
    /// [`NO_DATA_ZONE_NAME`] at (0, 0).
    pub async fn analyze_by_addresses(
        &self,
        seeds: &[String],
        city: &str,
        radius_meters: u32,
        options: ScanOptions,
    ) -> AnalysisReport {
        log::info!("Starting zone analysis with {} seed addresses", seeds.len());

        let matches = self.geocoder.resolve_multiple(seeds, city).await;
        let coordinates: Vec<Coordinate> = matches.iter().map(|m| m.coordinate).collect();

        let Some(center) = Coordinate::centroid(&coordinates) else {
            log::warn!("None of the {} seed addresses could be geocoded", seeds.len());
            return AnalysisReport::unresolved(
                Zone::empty(NO_DATA_ZONE_NAME, Coordinate::new(0.0, 0.0), radius_meters),
                seeds.len(),
            );
        };
        log::info!("Zone center: ({center})");

        let sampler = &self.sampler;
        let mut seen = BTreeSet::new();
        let mut records = Vec::new();
        for (m, seed) in matches.iter().zip(1..) {
            let label = m
                .display_name
                .clone()
                .unwrap_or_else(|| format!("seed {seed}"));
            for record in sampler
                .sample_area(&label, m.coordinate, radius_meters, options.grid_size)
                .await
            {
                if seen.insert(record.reference.clone()) {
                    records.push(record);
                }
            }
        }
        log::info!("Unique parcels across seeds: {}", records.len());

        let zone = self.build_zone(
            format!("Zone {city}"),
            center,
            radius_meters,
            records,
            options.residential_only,
        );

        AnalysisReport {
            zone,
            requested_inputs: seeds.len(),
            resolved_inputs: coordinates.len(),
        }
    }

    /// Analyzes a named area (neighborhood, district) using its bounding
    /// box: the grid is centered on the box and the radius covers its
    /// longer side.
    ///
    /// An unresolved name yields an empty zone with that name at (0, 0)
    /// and radius 0.
    pub async fn analyze_by_zone_name(
        &self,
        name: &str,
        city: &str,
        options: ScanOptions,
    ) -> AnalysisReport {
        log::info!("Analyzing zone by name: {name}, {city}");
        let bounds = self.geocoder.resolve_zone_bounds(name, city).await;
        self.analyze_bounds(name.to_string(), name, bounds, options)
            .await
    }

    /// Like [`Self::analyze_by_zone_name`] with the postal code as the
    /// place query. The zone is named `CP {code}`.
    pub async fn analyze_by_postal_code(
        &self,
        code: &str,
        city: &str,
        options: ScanOptions,
    ) -> AnalysisReport {
        log::info!("Analyzing postal code {code}, {city}");
        let bounds = self.geocoder.resolve_zone_bounds(code, city).await;
        self.analyze_bounds(format!("CP {code}"), code, bounds, options)
            .await
    }

    /// Analyzes the area around a single street, resolved as an address.
    /// The zone is named after the street.
    pub async fn analyze_by_street(
        &self,
        street: &str,
        city: &str,
        radius_meters: u32,
        options: ScanOptions,
    ) -> AnalysisReport {
        log::info!("Analyzing street {street}, {city}");
        let country = self.geocoder.default_country().to_string();

        let Some(hit) = self.geocoder.resolve_address(street, city, &country).await else {
            log::warn!("Could not geocode street: {street}");
            return AnalysisReport::unresolved(
                Zone::empty(street, Coordinate::new(0.0, 0.0), radius_meters),
                1,
            );
        };

        let records = self
            .sampler
            .sample_area(street, hit.coordinate, radius_meters, options.grid_size)
            .await;
        let zone = self.build_zone(
            street.to_string(),
            hit.coordinate,
            radius_meters,
            records,
            options.residential_only,
        );

        AnalysisReport {
            zone,
            requested_inputs: 1,
            resolved_inputs: 1,
        }
    }

    async fn analyze_bounds(
        &self,
        zone_name: String,
        query: &str,
        bounds: Option<ZoneBounds>,
        options: ScanOptions,
    ) -> AnalysisReport {
        let Some(bounds) = bounds else {
            log::warn!("Could not geocode zone: {query}");
            return AnalysisReport::unresolved(
                Zone::empty(zone_name, Coordinate::new(0.0, 0.0), 0),
                1,
            );
        };

        let radius_meters = bounds.bounding_box.covering_radius_meters();
        log::info!(
            "Zone area: {:.2} km², approximate radius: {radius_meters}m",
            bounds.area_km2
        );

        let records = self
            .sampler
            .sample_area(&zone_name, bounds.center, radius_meters, options.grid_size)
            .await;
        let zone = self.build_zone(
            zone_name,
            bounds.center,
            radius_meters,
            records,
            options.residential_only,
        );

        AnalysisReport {
            zone,
            requested_inputs: 1,
            resolved_inputs: 1,
        }
    }

    fn build_zone(
        &self,
        name: String,
        center: Coordinate,
        radius_meters: u32,
        records: Vec<ParcelRecord>,
        residential_only: bool,
    ) -> Zone {
        let found = records.len();
        let buildings: Vec<_> = records
            .into_iter()
            .filter(|r| !residential_only || self.classifier.is_residential(r.usage.as_deref()))
            .map(|r| self.classifier.classify(r))
            .collect();

        if buildings.len() < found {
            log::debug!(
                "Residential filter kept {} of {found} parcels",
                buildings.len()
            );
        }

        let zone = aggregate(name, center, radius_meters, buildings);
        log::info!(
            "Analysis complete: {} buildings, opportunity density {:.2}",
            zone.summary.total_buildings,
            zone.summary.density
        );
        zone
    }
}
