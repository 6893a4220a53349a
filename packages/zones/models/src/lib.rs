#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Core types for elevator-modernization zone scoring.
//!
//! Raw cadastre data arrives as a [`ParcelRecord`], is classified into a
//! [`CandidateBuilding`], and buildings are folded into a [`Zone`] with a
//! precomputed [`ZoneSummary`]. A zone owns its buildings outright and
//! keeps no reference back to the services that produced them; nothing in
//! this crate mutates a zone after construction.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString, IntoStaticStr};

/// Kilometers per degree of latitude (and of longitude at the equator).
///
/// Meters-to-degrees conversion uses this flat approximation with a single
/// `cos(latitude)` correction for longitude. It is only accurate at
/// city-district scale away from the poles.
pub const KM_PER_DEGREE: f64 = 111.0;

/// A WGS84 coordinate in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Latitude, -90..=90.
    pub latitude: f64,
    /// Longitude, -180..=180.
    pub longitude: f64,
}

impl Coordinate {
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Whether both components are finite and inside the WGS84 ranges.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }

    /// Arithmetic mean of a set of coordinates, `None` when empty.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn centroid(points: &[Self]) -> Option<Self> {
        if points.is_empty() {
            return None;
        }
        let n = points.len() as f64;
        let lat = points.iter().map(|p| p.latitude).sum::<f64>() / n;
        let lon = points.iter().map(|p| p.longitude).sum::<f64>() / n;
        Some(Self::new(lat, lon))
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.6}, {:.6}", self.latitude, self.longitude)
    }
}

/// An axis-aligned bounding box in degrees, in the geocoder's
/// `[lat_min, lat_max, lon_min, lon_max]` order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub lat_min: f64,
    pub lat_max: f64,
    pub lon_min: f64,
    pub lon_max: f64,
}

impl BoundingBox {
    /// Builds a box from the geocoder's four-element array.
    #[must_use]
    pub const fn from_array(values: [f64; 4]) -> Self {
        Self {
            lat_min: values[0],
            lat_max: values[1],
            lon_min: values[2],
            lon_max: values[3],
        }
    }

    #[must_use]
    pub const fn to_array(&self) -> [f64; 4] {
        [self.lat_min, self.lat_max, self.lon_min, self.lon_max]
    }

    #[must_use]
    pub fn center(&self) -> Coordinate {
        Coordinate::new(
            f64::midpoint(self.lat_min, self.lat_max),
            f64::midpoint(self.lon_min, self.lon_max),
        )
    }

    /// North-south and east-west extents in kilometers, measured at the
    /// box center latitude.
    #[must_use]
    pub fn extent_km(&self) -> (f64, f64) {
        let lat_km = (self.lat_max - self.lat_min) * KM_PER_DEGREE;
        let lon_km = (self.lon_max - self.lon_min)
            * KM_PER_DEGREE
            * self.center().latitude.to_radians().cos();
        (lat_km, lon_km)
    }

    #[must_use]
    pub fn area_km2(&self) -> f64 {
        let (lat_km, lon_km) = self.extent_km();
        lat_km * lon_km
    }

    /// Sampling radius covering the box: half of its longer side, in whole
    /// meters.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn covering_radius_meters(&self) -> u32 {
        let (lat_km, lon_km) = self.extent_km();
        let meters = (lat_km.max(lon_km) * 1000.0 / 2.0).max(0.0);
        meters.floor() as u32
    }
}

/// A single geocoder hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoMatch {
    pub coordinate: Coordinate,
    /// Human-readable name of the matched place.
    pub display_name: Option<String>,
    /// Geocoder type tag (e.g. `"residential"`, `"suburb"`).
    pub kind: Option<String>,
    /// Geocoder relevance score, 0 when absent.
    pub importance: f64,
    pub bounding_box: Option<BoundingBox>,
}

/// A named area resolved to its center and extent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneBounds {
    pub center: Coordinate,
    pub bounding_box: BoundingBox,
    pub area_km2: f64,
    pub display_name: Option<String>,
}

impl ZoneBounds {
    /// Derives center and area from a bounding box.
    #[must_use]
    pub fn from_bounding_box(bounding_box: BoundingBox, display_name: Option<String>) -> Self {
        Self {
            center: bounding_box.center(),
            bounding_box,
            area_km2: bounding_box.area_km2(),
            display_name,
        }
    }
}

/// A cadastral parcel as returned by the parcel lookup service.
///
/// Never mutated after creation. An empty `reference` is never produced:
/// the lookup treats it as "no parcel".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParcelRecord {
    /// Cadastral reference, unique per real-world parcel.
    pub reference: String,
    pub address: Option<String>,
    /// Usage code or description (e.g. `"Residencial"`, `"1-"`).
    pub usage: Option<String>,
    /// Built surface in square meters, 0 when unknown.
    pub floor_area_m2: f64,
    pub construction_year: Option<i32>,
    /// Parcel centroid, when the service reports one.
    pub coordinate: Option<Coordinate>,
}

/// Age bracket of a building.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    IntoStaticStr,
)]
pub enum AgeCategory {
    /// 50 years or older.
    #[serde(rename = "very old")]
    #[strum(serialize = "very old")]
    VeryOld,
    /// 30 to 49 years.
    #[serde(rename = "old")]
    #[strum(serialize = "old")]
    Old,
    /// Under 30 years.
    #[serde(rename = "modern")]
    #[strum(serialize = "modern")]
    Modern,
    /// Construction year not known.
    #[serde(rename = "unknown")]
    #[strum(serialize = "unknown")]
    Unknown,
}

impl AgeCategory {
    /// Descriptive label with the bracket bounds, for reports.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::VeryOld => "Very old (>50 years)",
            Self::Old => "Old (30-50 years)",
            Self::Modern => "Modern (<30 years)",
            Self::Unknown => "No data",
        }
    }
}

/// A parcel that passed the residential filter, scored by age.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateBuilding {
    pub reference: String,
    pub address: Option<String>,
    pub coordinate: Option<Coordinate>,
    pub construction_year: Option<i32>,
    /// `None` exactly when `construction_year` is `None`.
    pub age_years: Option<i32>,
    pub usage: Option<String>,
    pub floor_area_m2: f64,
    /// Non-negative modernization opportunity score.
    pub modernization_score: f64,
    pub age_category: AgeCategory,
}

/// Number of buildings constructed in one decade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecadeCount {
    /// First year of the decade (e.g. 1960).
    pub decade: i32,
    pub count: usize,
}

impl DecadeCount {
    /// Label such as `"1960s"`.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{}s", self.decade)
    }
}

/// Aggregate statistics of a zone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ZoneSummary {
    /// All buildings, including those with unknown age.
    pub total_buildings: usize,
    pub very_old: usize,
    pub old: usize,
    pub modern: usize,
    /// Sum of all building scores.
    pub score_total: f64,
    /// `score_total / total_buildings`, 0 for an empty zone.
    pub density: f64,
    /// Buildings with a known construction year, ascending by decade.
    pub by_decade: Vec<DecadeCount>,
}

impl ZoneSummary {
    /// Share of `count` over all buildings, as a percentage (0 when empty).
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn percentage(&self, count: usize) -> f64 {
        if self.total_buildings == 0 {
            0.0
        } else {
            count as f64 / self.total_buildings as f64 * 100.0
        }
    }

    #[must_use]
    pub fn max_decade_count(&self) -> usize {
        self.by_decade.iter().map(|d| d.count).max().unwrap_or(0)
    }
}

/// The result of one zone analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub name: String,
    pub center: Coordinate,
    pub radius_meters: u32,
    pub buildings: Vec<CandidateBuilding>,
    pub summary: ZoneSummary,
}

impl Zone {
    /// A zone with no buildings and all statistics zeroed.
    #[must_use]
    pub fn empty(name: impl Into<String>, center: Coordinate, radius_meters: u32) -> Self {
        Self {
            name: name.into(),
            center,
            radius_meters,
            buildings: Vec::new(),
            summary: ZoneSummary::default(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buildings.is_empty()
    }
}
