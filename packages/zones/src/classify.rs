//! Age-based classification and scoring of parcels.

use serde::{Deserialize, Serialize};
use zone_radar_zones_models::{AgeCategory, CandidateBuilding, ParcelRecord};

/// Age thresholds, score weights, and the residential usage filter.
///
/// The defaults are the reference weights; every field can be overridden
/// from configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Minimum age (years) of a "very old" building.
    pub very_old_age: i32,
    /// Minimum age (years) of an "old" building.
    pub old_age: i32,
    pub very_old_weight: f64,
    pub old_weight: f64,
    pub modern_weight: f64,
    pub unknown_weight: f64,
    /// Case-insensitive substrings that mark a usage as residential.
    ///
    /// `almacen`, `1-` and `2-` are storage-class codes carried over from
    /// the reference filter. Whether they belong here is unresolved.
    pub residential_keywords: Vec<String>,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            very_old_age: 50,
            old_age: 30,
            very_old_weight: 3.0,
            old_weight: 2.0,
            modern_weight: 0.5,
            unknown_weight: 0.0,
            residential_keywords: ["resid", "viviend", "almacen", "1-", "2-"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

/// Turns parcel records into scored [`CandidateBuilding`]s.
///
/// Ages are computed against a fixed `current_year` so a classifier gives
/// the same answer for the whole run.
#[derive(Debug, Clone)]
pub struct BuildingClassifier {
    config: ScoringConfig,
    current_year: i32,
}

impl BuildingClassifier {
    #[must_use]
    pub const fn new(config: ScoringConfig, current_year: i32) -> Self {
        Self {
            config,
            current_year,
        }
    }

    /// Classifier pinned to the local calendar year.
    #[must_use]
    pub fn for_current_year(config: ScoringConfig) -> Self {
        use chrono::Datelike as _;

        Self::new(config, chrono::Local::now().year())
    }

    #[must_use]
    pub const fn config(&self) -> &ScoringConfig {
        &self.config
    }

    #[must_use]
    pub const fn current_year(&self) -> i32 {
        self.current_year
    }

    /// Whether `usage` contains any residential keyword.
    ///
    /// A missing usage is not residential.
    #[must_use]
    pub fn is_residential(&self, usage: Option<&str>) -> bool {
        let Some(usage) = usage else {
            return false;
        };
        let usage = usage.to_lowercase();
        self.config
            .residential_keywords
            .iter()
            .any(|kw| usage.contains(&kw.to_lowercase()))
    }

    #[must_use]
    pub fn age_of(&self, construction_year: Option<i32>) -> Option<i32> {
        construction_year.map(|year| self.current_year - year)
    }

    #[must_use]
    pub const fn category(&self, age_years: Option<i32>) -> AgeCategory {
        match age_years {
            None => AgeCategory::Unknown,
            Some(age) if age >= self.config.very_old_age => AgeCategory::VeryOld,
            Some(age) if age >= self.config.old_age => AgeCategory::Old,
            Some(_) => AgeCategory::Modern,
        }
    }

    #[must_use]
    pub const fn score(&self, category: AgeCategory) -> f64 {
        match category {
            AgeCategory::VeryOld => self.config.very_old_weight,
            AgeCategory::Old => self.config.old_weight,
            AgeCategory::Modern => self.config.modern_weight,
            AgeCategory::Unknown => self.config.unknown_weight,
        }
    }

    /// Derives a building from a parcel. The record is consumed.
    #[must_use]
    pub fn classify(&self, record: ParcelRecord) -> CandidateBuilding {
        let age_years = self.age_of(record.construction_year);
        let age_category = self.category(age_years);

        CandidateBuilding {
            reference: record.reference,
            address: record.address,
            coordinate: record.coordinate,
            construction_year: record.construction_year,
            age_years,
            usage: record.usage,
            floor_area_m2: record.floor_area_m2,
            modernization_score: self.score(age_category),
            age_category,
        }
    }
}

#[cfg(test)]
mod tests {
    use zone_radar_zones_models::Coordinate;

    use super::*;

    fn classifier() -> BuildingClassifier {
        BuildingClassifier::new(ScoringConfig::default(), 2024)
    }

    fn record(year: Option<i32>) -> ParcelRecord {
        ParcelRecord {
            reference: "REF".to_string(),
            address: Some("CL MAYOR 1".to_string()),
            usage: Some("Residencial".to_string()),
            floor_area_m2: 120.0,
            construction_year: year,
            coordinate: Some(Coordinate::new(28.1, -15.4)),
        }
    }

    #[test]
    fn building_from_1960_is_very_old() {
        let b = classifier().classify(record(Some(1960)));
        assert_eq!(b.age_years, Some(64));
        assert_eq!(b.age_category, AgeCategory::VeryOld);
        assert!((b.modernization_score - 3.0).abs() < f64::EPSILON);
        assert_eq!(b.reference, "REF");
        assert!((b.floor_area_m2 - 120.0).abs() < f64::EPSILON);
    }

    #[test]
    fn building_from_2010_is_modern() {
        let b = classifier().classify(record(Some(2010)));
        assert_eq!(b.age_years, Some(14));
        assert_eq!(b.age_category, AgeCategory::Modern);
        assert!((b.modernization_score - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn unknown_year_scores_zero() {
        let b = classifier().classify(record(None));
        assert_eq!(b.age_years, None);
        assert_eq!(b.age_category, AgeCategory::Unknown);
        assert!(b.modernization_score.abs() < f64::EPSILON);
    }

    #[test]
    fn bracket_boundaries() {
        let c = classifier();
        assert_eq!(c.category(Some(50)), AgeCategory::VeryOld);
        assert_eq!(c.category(Some(49)), AgeCategory::Old);
        assert_eq!(c.category(Some(30)), AgeCategory::Old);
        assert_eq!(c.category(Some(29)), AgeCategory::Modern);
        assert_eq!(c.category(Some(0)), AgeCategory::Modern);
    }

    #[test]
    fn score_is_monotonic_in_construction_year() {
        let c = classifier();
        let mut previous: Option<(i32, f64)> = None;
        for year in 1850..=2030 {
            let b = c.classify(record(Some(year)));
            if let Some((prev_age, prev_score)) = previous {
                assert!(prev_age >= b.age_years.unwrap());
                assert!(prev_score >= b.modernization_score, "year {year}");
            }
            previous = Some((b.age_years.unwrap(), b.modernization_score));
        }
    }

    #[test]
    fn residential_filter_is_case_insensitive_substring() {
        let c = classifier();
        assert!(c.is_residential(Some("RESIDENCIAL")));
        assert!(c.is_residential(Some("Vivienda colectiva")));
        assert!(c.is_residential(Some("Almacen-Estacionamiento")));
        assert!(c.is_residential(Some("1-")));
        assert!(!c.is_residential(Some("Industrial")));
        assert!(!c.is_residential(Some("")));
        assert!(!c.is_residential(None));
    }

    #[test]
    fn weights_are_configurable() {
        let config = ScoringConfig {
            very_old_weight: 10.0,
            ..ScoringConfig::default()
        };
        let b = BuildingClassifier::new(config, 2024).classify(record(Some(1900)));
        assert!((b.modernization_score - 10.0).abs() < f64::EPSILON);
    }
}
