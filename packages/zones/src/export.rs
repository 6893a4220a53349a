//! Zone exports: JSON document, CSV table, and plain-text report.
//!
//! Generation timestamps are passed in by the caller so output is
//! reproducible.

use std::path::Path;

use chrono::{DateTime, Local};
use serde::ser::SerializeMap as _;
use serde::{Serialize, Serializer};
use thiserror::Error;
use zone_radar_zones_models::{AgeCategory, CandidateBuilding, Coordinate, DecadeCount, Zone};

/// Header row of the tabular export.
pub const TABLE_HEADER: [&str; 10] = [
    "Reference",
    "Address",
    "Latitude",
    "Longitude",
    "Construction Year",
    "Age (years)",
    "Category",
    "Modernization Score",
    "Usage",
    "Floor Area (m²)",
];

const MISSING: &str = "N/A";
const BAR_WIDTH: f64 = 40.0;
const TOP_BUILDINGS: usize = 10;
const RULE_WIDTH: usize = 70;

/// Errors from writing export files.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct CenterDocument {
    pub lat: f64,
    pub lon: f64,
}

impl From<Coordinate> for CenterDocument {
    fn from(c: Coordinate) -> Self {
        Self {
            lat: c.latitude,
            lon: c.longitude,
        }
    }
}

/// Decade histogram serialized as an ordered `{"1960s": n, ...}` map.
#[derive(Debug, Clone, Copy)]
pub struct DecadeHistogram<'a>(pub &'a [DecadeCount]);

impl Serialize for DecadeHistogram<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for decade in self.0 {
            map.serialize_entry(&decade.label(), &decade.count)?;
        }
        map.end()
    }
}

#[derive(Debug, Serialize)]
pub struct SummaryDocument<'a> {
    pub total_buildings: usize,
    pub very_old: usize,
    pub old: usize,
    pub modern: usize,
    pub density: f64,
    pub score_total: f64,
    pub by_decade: DecadeHistogram<'a>,
}

#[derive(Debug, Serialize)]
pub struct BuildingDocument<'a> {
    pub reference: &'a str,
    pub address: Option<&'a str>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub year: Option<i32>,
    pub age: Option<i32>,
    pub category: &'static str,
    pub score: f64,
    pub usage: Option<&'a str>,
    pub area: f64,
}

impl<'a> From<&'a CandidateBuilding> for BuildingDocument<'a> {
    fn from(b: &'a CandidateBuilding) -> Self {
        Self {
            reference: &b.reference,
            address: b.address.as_deref(),
            lat: b.coordinate.map(|c| c.latitude),
            lon: b.coordinate.map(|c| c.longitude),
            year: b.construction_year,
            age: b.age_years,
            category: b.age_category.into(),
            score: b.modernization_score,
            usage: b.usage.as_deref(),
            area: b.floor_area_m2,
        }
    }
}

/// Structured export of one zone.
#[derive(Debug, Serialize)]
pub struct ZoneDocument<'a> {
    pub name: &'a str,
    pub center: CenterDocument,
    pub radius_meters: u32,
    pub summary: SummaryDocument<'a>,
    pub buildings: Vec<BuildingDocument<'a>>,
    pub generated_at: String,
}

#[must_use]
pub fn to_structured_record(zone: &Zone, generated_at: DateTime<Local>) -> ZoneDocument<'_> {
    let s = &zone.summary;
    ZoneDocument {
        name: &zone.name,
        center: zone.center.into(),
        radius_meters: zone.radius_meters,
        summary: SummaryDocument {
            total_buildings: s.total_buildings,
            very_old: s.very_old,
            old: s.old,
            modern: s.modern,
            density: round2(s.density),
            score_total: round2(s.score_total),
            by_decade: DecadeHistogram(&s.by_decade),
        },
        buildings: zone.buildings.iter().map(BuildingDocument::from).collect(),
        generated_at: generated_at.to_rfc3339(),
    }
}

/// One row per building, in building order, matching [`TABLE_HEADER`].
/// Missing values are rendered as `N/A`.
#[must_use]
pub fn to_table(zone: &Zone) -> Vec<[String; 10]> {
    fn or_missing<T: ToString>(value: Option<T>) -> String {
        value.map_or_else(|| MISSING.to_string(), |v| v.to_string())
    }

    zone.buildings
        .iter()
        .map(|b| {
            [
                b.reference.clone(),
                or_missing(b.address.as_deref()),
                or_missing(b.coordinate.map(|c| c.latitude)),
                or_missing(b.coordinate.map(|c| c.longitude)),
                or_missing(b.construction_year),
                or_missing(b.age_years),
                b.age_category.to_string(),
                format!("{:.2}", b.modernization_score),
                or_missing(b.usage.as_deref()),
                b.floor_area_m2.to_string(),
            ]
        })
        .collect()
}

/// Writes `document` as pretty-printed JSON.
///
/// # Errors
///
/// * If serialization fails
/// * If the file cannot be written
pub fn write_json<T: Serialize + ?Sized>(path: &Path, document: &T) -> Result<(), ExportError> {
    let json = serde_json::to_string_pretty(document)?;
    std::fs::write(path, json)?;
    log::info!("Exported JSON: {}", path.display());
    Ok(())
}

/// Writes the tabular export with its header row.
///
/// # Errors
///
/// * If the file cannot be created or written
pub fn write_csv(path: &Path, zone: &Zone) -> Result<(), ExportError> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(TABLE_HEADER)?;
    for row in to_table(zone) {
        writer.write_record(&row)?;
    }
    writer.flush()?;
    log::info!("Exported CSV: {}", path.display());
    Ok(())
}

/// Buildings ordered by descending score, ties in input order.
fn by_score(buildings: &[CandidateBuilding]) -> Vec<&CandidateBuilding> {
    let mut sorted: Vec<_> = buildings.iter().collect();
    sorted.sort_by(|a, b| b.modernization_score.total_cmp(&a.modernization_score));
    sorted
}

#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn bar_length(count: usize, max: usize) -> usize {
    if max == 0 {
        return 0;
    }
    (count as f64 / max as f64 * BAR_WIDTH).round() as usize
}

fn section(lines: &mut Vec<String>, title: &str) {
    let rule = "=".repeat(RULE_WIDTH);
    lines.push(rule.clone());
    lines.push(title.to_string());
    lines.push(rule);
    lines.push(String::new());
}

/// Human-readable report: header, executive summary, decade histogram,
/// top buildings by score, and a footer with the generation time.
#[must_use]
pub fn to_report(zone: &Zone, generated_at: DateTime<Local>) -> String {
    let s = &zone.summary;
    let mut lines = Vec::new();

    section(
        &mut lines,
        "MODERNIZATION HOT ZONE ANALYSIS - ELEVATOR MODERNIZATION",
    );
    lines.push(format!("Zone: {}", zone.name));
    lines.push(format!("Center: {}", zone.center));
    lines.push(format!("Analysis radius: {} meters", zone.radius_meters));
    lines.push(String::new());

    section(&mut lines, "EXECUTIVE SUMMARY");
    lines.push(format!("Total buildings analyzed: {}", s.total_buildings));
    lines.push(String::new());
    lines.push("Distribution by age:".to_string());
    for (category, count) in [
        (AgeCategory::VeryOld, s.very_old),
        (AgeCategory::Old, s.old),
        (AgeCategory::Modern, s.modern),
    ] {
        lines.push(format!(
            "  - {:<22} {count:>4} buildings ({:.1}%)",
            category.label(),
            s.percentage(count)
        ));
    }
    lines.push(String::new());
    lines.push(format!("Total opportunity score: {:.2}", s.score_total));
    lines.push(format!(
        "Opportunity density: {:.2} (average per building)",
        s.density
    ));
    lines.push(String::new());

    section(&mut lines, "DISTRIBUTION BY CONSTRUCTION DECADE");
    let max = s.max_decade_count();
    for decade in &s.by_decade {
        lines.push(format!(
            "{}: {} {}",
            decade.label(),
            "█".repeat(bar_length(decade.count, max)),
            decade.count
        ));
    }
    lines.push(String::new());

    section(&mut lines, "TOP 10 PRIORITY BUILDINGS");
    for (position, b) in by_score(&zone.buildings)
        .into_iter()
        .take(TOP_BUILDINGS)
        .enumerate()
    {
        lines.push(format!(
            "{:>2}. {}",
            position + 1,
            b.address.as_deref().unwrap_or(MISSING)
        ));
        lines.push(format!(
            "    Year: {} | Age: {} | Score: {:.2}",
            b.construction_year
                .map_or_else(|| MISSING.to_string(), |y| y.to_string()),
            b.age_years
                .map_or_else(|| MISSING.to_string(), |a| format!("{a} years")),
            b.modernization_score
        ));
        lines.push(format!("    Cadastral ref: {}", b.reference));
        lines.push(String::new());
    }

    let rule = "=".repeat(RULE_WIDTH);
    lines.push(rule.clone());
    lines.push(format!(
        "Generated: {}",
        generated_at.format("%d/%m/%Y %H:%M")
    ));
    lines.push(rule);

    let mut report = lines.join("\n");
    report.push('\n');
    report
}

#[derive(Debug, Serialize)]
pub struct RankingMetrics {
    pub score_total: f64,
    pub density: f64,
    pub total_buildings: usize,
    pub very_old: usize,
    pub old: usize,
    pub modern: usize,
    pub very_old_pct: f64,
    pub old_pct: f64,
}

#[derive(Debug, Serialize)]
pub struct RankingEntry<'a> {
    pub position: usize,
    pub name: &'a str,
    pub metrics: RankingMetrics,
    pub center: CenterDocument,
    pub radius_meters: u32,
    pub by_decade: DecadeHistogram<'a>,
}

/// Comparison export of several zones.
#[derive(Debug, Serialize)]
pub struct RankingDocument<'a> {
    pub generated_at: String,
    pub criterion: &'a str,
    pub city: &'a str,
    pub zones_analyzed: usize,
    pub ranking: Vec<RankingEntry<'a>>,
}

/// Builds the ranking export. `ranked` must already be in rank order
/// (see [`crate::compare::rank`]); positions start at 1.
#[must_use]
pub fn ranking_document<'a>(
    ranked: &'a [Zone],
    criterion: &'a str,
    city: &'a str,
    generated_at: DateTime<Local>,
) -> RankingDocument<'a> {
    let ranking = ranked
        .iter()
        .enumerate()
        .map(|(i, zone)| {
            let s = &zone.summary;
            RankingEntry {
                position: i + 1,
                name: &zone.name,
                metrics: RankingMetrics {
                    score_total: round2(s.score_total),
                    density: round2(s.density),
                    total_buildings: s.total_buildings,
                    very_old: s.very_old,
                    old: s.old,
                    modern: s.modern,
                    very_old_pct: round1(s.percentage(s.very_old)),
                    old_pct: round1(s.percentage(s.old)),
                },
                center: zone.center.into(),
                radius_meters: zone.radius_meters,
                by_decade: DecadeHistogram(&s.by_decade),
            }
        })
        .collect();

    RankingDocument {
        generated_at: generated_at.to_rfc3339(),
        criterion,
        city,
        zones_analyzed: ranked.len(),
        ranking,
    }
}

/// File-name-safe form of a zone name.
#[must_use]
pub fn file_stem(zone_name: &str) -> String {
    let mut stem = String::with_capacity(zone_name.len());
    for c in zone_name.trim().chars() {
        if c.is_alphanumeric() {
            stem.extend(c.to_lowercase());
        } else {
            stem.push('_');
        }
    }
    if stem.is_empty() {
        "zone".to_string()
    } else {
        stem
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use zone_radar_zones_models::ParcelRecord;

    use super::*;
    use crate::aggregate::aggregate;
    use crate::classify::{BuildingClassifier, ScoringConfig};

    fn parcel(reference: &str, year: Option<i32>, address: Option<&str>) -> ParcelRecord {
        ParcelRecord {
            reference: reference.to_string(),
            address: address.map(String::from),
            usage: Some("Residencial".to_string()),
            floor_area_m2: 95.5,
            construction_year: year,
            coordinate: Some(Coordinate::new(28.1, -15.4)),
        }
    }

    fn sample_zone() -> Zone {
        let classifier = BuildingClassifier::new(ScoringConfig::default(), 2024);
        let buildings = vec![
            parcel("A", Some(2010), Some("CL NUEVA 1")),
            parcel("B", Some(1960), Some("CL VIEJA 2")),
            parcel("C", None, None),
            parcel("D", Some(1965), Some("CL VIEJA 4")),
            parcel("E", Some(1985), Some("AV MEDIA 3")),
        ]
        .into_iter()
        .map(|p| classifier.classify(p))
        .collect();
        aggregate("Triana", Coordinate::new(28.1, -15.4), 300, buildings)
    }

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("zone_radar_export_{}_{name}", std::process::id()))
    }

    #[test]
    fn structured_record_shape() {
        let zone = sample_zone();
        let now = Local::now();
        let value = serde_json::to_value(to_structured_record(&zone, now)).unwrap();

        assert_eq!(value["name"], "Triana");
        assert_eq!(value["center"]["lat"], 28.1);
        assert_eq!(value["center"]["lon"], -15.4);
        assert_eq!(value["radius_meters"], 300);
        assert_eq!(value["generated_at"], now.to_rfc3339());

        let summary = &value["summary"];
        assert_eq!(summary["total_buildings"], 5);
        assert_eq!(summary["very_old"], 2);
        assert_eq!(summary["old"], 1);
        assert_eq!(summary["modern"], 1);
        assert_eq!(summary["score_total"], 8.5);
        assert_eq!(summary["density"], 1.7);
        assert_eq!(summary["by_decade"]["1960s"], 2);
        assert_eq!(summary["by_decade"]["2010s"], 1);

        let buildings = value["buildings"].as_array().unwrap();
        assert_eq!(buildings.len(), 5);
        assert_eq!(buildings[1]["reference"], "B");
        assert_eq!(buildings[1]["category"], "very old");
        assert_eq!(buildings[1]["age"], 64);
        assert_eq!(buildings[2]["year"], serde_json::Value::Null);
        assert_eq!(buildings[2]["category"], "unknown");
        assert_eq!(buildings[2]["address"], serde_json::Value::Null);
    }

    #[test]
    fn decade_histogram_keeps_order_in_output() {
        let zone = sample_zone();
        let json = serde_json::to_string(&DecadeHistogram(&zone.summary.by_decade)).unwrap();
        assert_eq!(json, r#"{"1960s":2,"1980s":1,"2010s":1}"#);
    }

    #[test]
    fn table_rows_fill_missing_values() {
        let zone = sample_zone();
        let rows = to_table(&zone);
        assert_eq!(rows.len(), 5);
        assert_eq!(
            rows[1],
            [
                "B",
                "CL VIEJA 2",
                "28.1",
                "-15.4",
                "1960",
                "64",
                "very old",
                "3.00",
                "Residencial",
                "95.5"
            ]
        );
        assert_eq!(rows[2][1], "N/A");
        assert_eq!(rows[2][4], "N/A");
        assert_eq!(rows[2][5], "N/A");
        assert_eq!(rows[2][6], "unknown");
    }

    #[test]
    fn csv_export_has_header_and_rows() {
        let zone = sample_zone();
        let path = temp_path("table.csv");
        write_csv(&path, &zone).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert_eq!(
            lines.next().unwrap(),
            "Reference,Address,Latitude,Longitude,Construction Year,Age (years),\
             Category,Modernization Score,Usage,Floor Area (m²)"
        );
        assert_eq!(lines.count(), 5);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn json_export_round_trips_as_value() {
        let zone = sample_zone();
        let path = temp_path("zone.json");
        write_json(&path, &to_structured_record(&zone, Local::now())).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["summary"]["total_buildings"], 5);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn report_sections_in_order() {
        let zone = sample_zone();
        let now = Local::now();
        let report = to_report(&zone, now);

        let positions: Vec<_> = [
            "MODERNIZATION HOT ZONE ANALYSIS",
            "EXECUTIVE SUMMARY",
            "DISTRIBUTION BY CONSTRUCTION DECADE",
            "TOP 10 PRIORITY BUILDINGS",
            "Generated:",
        ]
        .iter()
        .map(|needle| report.find(needle).unwrap())
        .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));

        assert!(report.contains("Zone: Triana"));
        assert!(report.contains("Total buildings analyzed: 5"));
        assert!(report.contains("(40.0%)"));
        assert!(report.contains("Total opportunity score: 8.50"));
        assert!(report.contains("Opportunity density: 1.70"));
        assert!(report.contains(&now.format("%d/%m/%Y %H:%M").to_string()));
    }

    #[test]
    fn report_bars_are_proportional() {
        let zone = sample_zone();
        let report = to_report(&zone, Local::now());

        let bar = |label: &str| {
            report
                .lines()
                .find(|l| l.starts_with(label))
                .unwrap()
                .chars()
                .filter(|c| *c == '█')
                .count()
        };
        assert_eq!(bar("1960s"), 40);
        assert_eq!(bar("1980s"), 20);
        assert_eq!(bar("2010s"), 20);
    }

    #[test]
    fn report_top_buildings_by_score() {
        let zone = sample_zone();
        let report = to_report(&zone, Local::now());

        let first = report.find(" 1. CL VIEJA 2").unwrap();
        let second = report.find(" 2. CL VIEJA 4").unwrap();
        let third = report.find(" 3. AV MEDIA 3").unwrap();
        let fourth = report.find(" 4. CL NUEVA 1").unwrap();
        assert!(first < second && second < third && third < fourth);
        assert!(report.contains(" 5. N/A"));
    }

    #[test]
    fn report_of_empty_zone() {
        let zone = Zone::empty("Nowhere", Coordinate::new(0.0, 0.0), 0);
        let report = to_report(&zone, Local::now());
        assert!(report.contains("Total buildings analyzed: 0"));
        assert!(report.contains("(0.0%)"));
        assert!(!report.contains(" 1. "));
    }

    #[test]
    fn top_list_is_capped_at_ten() {
        let classifier = BuildingClassifier::new(ScoringConfig::default(), 2024);
        let buildings = (0..15)
            .map(|i| classifier.classify(parcel(&format!("R{i}"), Some(1950), Some("CL X"))))
            .collect();
        let zone = aggregate("Many", Coordinate::new(28.1, -15.4), 300, buildings);
        let report = to_report(&zone, Local::now());
        assert!(report.contains("10. CL X"));
        assert!(!report.contains("11. CL X"));
    }

    #[test]
    fn ranking_document_positions_and_metrics() {
        let mut other = Zone::empty("Vegueta", Coordinate::new(28.0, -15.41), 200);
        other.summary.score_total = 1.0;
        let ranked = crate::compare::rank(vec![other, sample_zone()]);
        let doc = ranking_document(&ranked, "postal_code", "Las Palmas", Local::now());
        let value = serde_json::to_value(&doc).unwrap();

        assert_eq!(value["criterion"], "postal_code");
        assert_eq!(value["city"], "Las Palmas");
        assert_eq!(value["zones_analyzed"], 2);
        assert_eq!(value["ranking"][0]["position"], 1);
        assert_eq!(value["ranking"][0]["name"], "Triana");
        assert_eq!(value["ranking"][0]["metrics"]["very_old_pct"], 40.0);
        assert_eq!(value["ranking"][0]["metrics"]["old_pct"], 20.0);
        assert_eq!(value["ranking"][1]["position"], 2);
        assert_eq!(value["ranking"][1]["name"], "Vegueta");
        assert_eq!(value["ranking"][1]["radius_meters"], 200);
    }

    #[test]
    fn file_stems_are_safe() {
        assert_eq!(file_stem("CP 35001"), "cp_35001");
        assert_eq!(file_stem("Calle Mayor de Triana"), "calle_mayor_de_triana");
        assert_eq!(file_stem("  "), "zone");
    }

    #[test]
    fn file_stems_lowercase_accented_letters() {
        assert_eq!(file_stem("Ciudad JARDÍN"), "ciudad_jardín");
        assert_eq!(file_stem("ÑAMERÍA"), "ñamería");
    }
}
