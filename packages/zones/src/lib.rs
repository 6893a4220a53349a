#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Modernization opportunity scoring for urban zones.
//!
//! A zone is built by sampling cadastral parcels on a grid around a
//! center ([`sampler`]), scoring each residential parcel by building age
//! ([`classify`]), and folding the results into zone statistics
//! ([`aggregate`]). Zones can be ranked ([`compare`]) and exported as
//! JSON, CSV, or a text report ([`export`]). [`analyzer`] wires these to
//! the geocoder and the cadastre for the supported entry points.

pub mod aggregate;
pub mod analyzer;
pub mod classify;
pub mod compare;
pub mod export;
pub mod progress;
pub mod sampler;

pub use analyzer::{AnalysisReport, ScanOptions, ZoneAnalyzer};
pub use classify::{BuildingClassifier, ScoringConfig};
pub use export::ExportError;
pub use progress::ScanEvent;
