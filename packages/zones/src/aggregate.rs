//! Per-zone statistics.

use std::collections::BTreeMap;

use zone_radar_zones_models::{
    AgeCategory, CandidateBuilding, Coordinate, DecadeCount, Zone, ZoneSummary,
};

/// Builds a [`Zone`] from classified buildings.
///
/// Bracket counts follow each building's category, so buildings of
/// unknown age count towards `total_buildings` only. The decade histogram
/// covers buildings with a known construction year.
#[must_use]
pub fn aggregate(
    name: impl Into<String>,
    center: Coordinate,
    radius_meters: u32,
    buildings: Vec<CandidateBuilding>,
) -> Zone {
    let summary = summarize(&buildings);
    Zone {
        name: name.into(),
        center,
        radius_meters,
        buildings,
        summary,
    }
}

#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn summarize(buildings: &[CandidateBuilding]) -> ZoneSummary {
    let mut summary = ZoneSummary {
        total_buildings: buildings.len(),
        ..ZoneSummary::default()
    };
    let mut decades: BTreeMap<i32, usize> = BTreeMap::new();

    for b in buildings {
        match b.age_category {
            AgeCategory::VeryOld => summary.very_old += 1,
            AgeCategory::Old => summary.old += 1,
            AgeCategory::Modern => summary.modern += 1,
            AgeCategory::Unknown => {}
        }
        summary.score_total += b.modernization_score;

        if let Some(year) = b.construction_year {
            *decades.entry(year.div_euclid(10) * 10).or_default() += 1;
        }
    }

    if !buildings.is_empty() {
        summary.density = summary.score_total / buildings.len() as f64;
    }
    summary.by_decade = decades
        .into_iter()
        .map(|(decade, count)| DecadeCount { decade, count })
        .collect();

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{BuildingClassifier, ScoringConfig};
    use zone_radar_zones_models::ParcelRecord;

    fn building(reference: &str, year: Option<i32>) -> CandidateBuilding {
        BuildingClassifier::new(ScoringConfig::default(), 2024).classify(ParcelRecord {
            reference: reference.to_string(),
            address: None,
            usage: Some("Residencial".to_string()),
            floor_area_m2: 0.0,
            construction_year: year,
            coordinate: None,
        })
    }

    fn center() -> Coordinate {
        Coordinate::new(28.1, -15.4)
    }

    #[test]
    fn empty_zone_is_all_zero() {
        let zone = aggregate("Empty", center(), 200, Vec::new());
        assert!(zone.is_empty());
        assert_eq!(zone.summary, ZoneSummary::default());
    }

    #[test]
    fn three_building_scenario() {
        let zone = aggregate(
            "Triana",
            center(),
            200,
            vec![
                building("A", Some(1960)),
                building("B", Some(2010)),
                building("C", None),
            ],
        );

        let s = &zone.summary;
        assert_eq!(s.total_buildings, 3);
        assert_eq!((s.very_old, s.old, s.modern), (1, 0, 1));
        assert!((s.score_total - 3.5).abs() < 1e-9);
        assert!((s.density - 3.5 / 3.0).abs() < 1e-9);
        assert_eq!(
            s.by_decade,
            vec![
                DecadeCount {
                    decade: 1960,
                    count: 1
                },
                DecadeCount {
                    decade: 2010,
                    count: 1
                },
            ]
        );
    }

    #[test]
    fn bracket_counts_never_exceed_total() {
        let buildings: Vec<_> = (0..40)
            .map(|i| building(&i.to_string(), (i % 3 != 0).then_some(1900 + i * 3)))
            .collect();
        let zone = aggregate("Mixed", center(), 200, buildings);
        let s = &zone.summary;
        assert!(s.very_old + s.old + s.modern <= s.total_buildings);
        assert_eq!(
            s.by_decade.iter().map(|d| d.count).sum::<usize>(),
            s.very_old + s.old + s.modern
        );
    }

    #[test]
    fn density_is_bounded_by_weights() {
        let buildings: Vec<_> = [Some(1900), Some(1950), Some(1985), Some(2020), None]
            .into_iter()
            .enumerate()
            .map(|(i, y)| building(&i.to_string(), y))
            .collect();
        let zone = aggregate("Bounded", center(), 200, buildings);
        assert!(zone.summary.density >= 0.0);
        assert!(zone.summary.density <= 3.0);
    }

    #[test]
    fn decades_are_ascending_and_floor_years() {
        let zone = aggregate(
            "Decades",
            center(),
            200,
            vec![
                building("A", Some(1999)),
                building("B", Some(1951)),
                building("C", Some(1959)),
                building("D", Some(1990)),
            ],
        );
        let labels: Vec<_> = zone
            .summary
            .by_decade
            .iter()
            .map(|d| (d.label(), d.count))
            .collect();
        assert_eq!(
            labels,
            vec![("1950s".to_string(), 2), ("1990s".to_string(), 2)]
        );
    }
}
