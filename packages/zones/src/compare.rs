//! Ranking of analyzed zones.

use zone_radar_zones_models::Zone;

/// Orders zones by descending total score.
///
/// The sort is stable, so zones with equal scores keep their input order.
#[must_use]
pub fn rank(mut zones: Vec<Zone>) -> Vec<Zone> {
    zones.sort_by(|a, b| b.summary.score_total.total_cmp(&a.summary.score_total));
    zones
}

#[cfg(test)]
mod tests {
    use super::*;
    use zone_radar_zones_models::Coordinate;

    fn zone(name: &str, score_total: f64) -> Zone {
        let mut zone = Zone::empty(name, Coordinate::new(28.1, -15.4), 200);
        zone.summary.score_total = score_total;
        zone
    }

    fn names(zones: &[Zone]) -> Vec<&str> {
        zones.iter().map(|z| z.name.as_str()).collect()
    }

    #[test]
    fn higher_score_first() {
        let ranked = rank(vec![zone("B", 85.0), zone("A", 120.5)]);
        assert_eq!(names(&ranked), ["A", "B"]);
    }

    #[test]
    fn ties_keep_input_order() {
        let ranked = rank(vec![
            zone("first", 10.0),
            zone("top", 50.0),
            zone("second", 10.0),
            zone("third", 10.0),
        ]);
        assert_eq!(names(&ranked), ["top", "first", "second", "third"]);
    }

    #[test]
    fn ranking_is_idempotent() {
        let once = rank(vec![
            zone("a", 1.0),
            zone("b", 7.5),
            zone("c", 0.0),
            zone("d", 7.5),
        ]);
        let twice = rank(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn empty_input() {
        assert!(rank(Vec::new()).is_empty());
    }
}
