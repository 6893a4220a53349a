//! Grid sampling of an area through point-based parcel lookups.
//!
//! The cadastre only answers "which parcel contains this point", so an
//! area is covered by probing an N×N grid around a center and keeping the
//! distinct parcels that come back.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use zone_radar_cadastre::ParcelLookup;
use zone_radar_zones_models::{Coordinate, KM_PER_DEGREE, ParcelRecord};

use crate::progress::{self, ScanEvent, ScanEventSender};

/// Default grid size for seed-based scans.
pub const DEFAULT_GRID_SIZE: u32 = 5;

/// Probe points for a `grid_size`×`grid_size` grid around `center`.
///
/// Offsets along each axis are `radius × (i − N/2) × 2/N` for
/// `i = 0..N`, converted to degrees with 111 km per degree (longitude
/// corrected by `cos(latitude)`). Row-major, latitude outer. The grid is
/// not symmetric around the center for odd or even `N`.
///
/// A `grid_size` of 0 yields no points.
#[must_use]
pub fn grid_points(center: Coordinate, radius_meters: f64, grid_size: u32) -> Vec<Coordinate> {
    let meters_per_degree = KM_PER_DEGREE * 1000.0;
    let delta_lat = radius_meters / meters_per_degree;
    let delta_lon = radius_meters / (meters_per_degree * center.latitude.to_radians().cos());

    let n = f64::from(grid_size);
    let offset = |i: u32| (f64::from(i) - n / 2.0) * 2.0 / n;

    let mut points = Vec::with_capacity((grid_size as usize).pow(2));
    for i in 0..grid_size {
        for j in 0..grid_size {
            points.push(Coordinate::new(
                delta_lat.mul_add(offset(i), center.latitude),
                delta_lon.mul_add(offset(j), center.longitude),
            ));
        }
    }
    points
}

/// Collects the distinct parcels around a center.
///
/// Pacing spans calls: the first query of a scan waits if an earlier scan
/// on the same sampler already queried the cadastre.
pub struct AreaSampler<'a> {
    lookup: &'a dyn ParcelLookup,
    pacing: Duration,
    events: Option<ScanEventSender>,
    queried: AtomicBool,
}

impl<'a> AreaSampler<'a> {
    /// `pacing` is waited between consecutive point queries.
    #[must_use]
    pub const fn new(lookup: &'a dyn ParcelLookup, pacing: Duration) -> Self {
        Self {
            lookup,
            pacing,
            events: None,
            queried: AtomicBool::new(false),
        }
    }

    #[must_use]
    pub const fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }

    #[must_use]
    pub fn with_events(mut self, events: Option<ScanEventSender>) -> Self {
        self.events = events;
        self
    }

    /// Probes every grid point in order and returns the parcels found,
    /// deduplicated by reference (first occurrence wins). Deduplication is
    /// per call.
    ///
    /// Points without a parcel are skipped; this never fails.
    pub async fn sample_area(
        &self,
        label: &str,
        center: Coordinate,
        radius_meters: u32,
        grid_size: u32,
    ) -> Vec<ParcelRecord> {
        let points = grid_points(center, f64::from(radius_meters), grid_size);
        log::info!(
            "Sampling {label}: {} points in a {grid_size}x{grid_size} grid, radius {radius_meters}m",
            points.len()
        );

        progress::emit(
            self.events.as_ref(),
            ScanEvent::Started {
                label: label.to_string(),
                total_points: points.len() as u64,
            },
        );

        let mut seen = BTreeSet::new();
        let mut parcels = Vec::new();

        for (index, point) in points.into_iter().enumerate() {
            if self.queried.swap(true, Ordering::Relaxed) && !self.pacing.is_zero() {
                tokio::time::sleep(self.pacing).await;
            }

            let new_parcel = match self.lookup.lookup_by_coordinate(point).await {
                Some(parcel) if seen.insert(parcel.reference.clone()) => {
                    parcels.push(parcel);
                    true
                }
                Some(parcel) => {
                    log::trace!("Already seen {}", parcel.reference);
                    false
                }
                None => false,
            };

            progress::emit(
                self.events.as_ref(),
                ScanEvent::PointProbed {
                    index: index as u64,
                    new_parcel,
                },
            );
        }

        log::info!("{label}: {} unique parcels", parcels.len());
        progress::emit(
            self.events.as_ref(),
            ScanEvent::Finished {
                unique_parcels: parcels.len() as u64,
            },
        );

        parcels
    }
}
