//! Per-waypoint candidate filtering and utility scoring.

use crate::models::{CellMetric, RadioMapProvider, ServiceProfile, Waypoint};
use crate::rules::PlannerConfig;

/// A cell eligible at one waypoint, with its planner utility.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub cell_id: String,
    pub metric: CellMetric,
    pub utility: f64,
}

/// Pure utility function: quality margin above the floor, minus load.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UtilityScorer {
    pub threshold_db: f64,
    pub w_quality: f64,
    pub w_load: f64,
    pub quality_scale_db: f64,
}

impl UtilityScorer {
    pub fn new(config: &PlannerConfig, service: Option<&ServiceProfile>) -> Self {
        Self {
            threshold_db: quality_threshold(config, service),
            w_quality: config.w_quality,
            w_load: config.w_load,
            quality_scale_db: config.quality_scale_db,
        }
    }

    pub fn normalize(&self, sinr_db: f64) -> f64 {
        (sinr_db - self.threshold_db) / self.quality_scale_db
    }

    /// Higher is better.
    pub fn utility(&self, sinr_db: f64, load: f64) -> f64 {
        self.w_quality * self.normalize(sinr_db) - self.w_load * load
    }
}

/// The service's SINR floor when one is given, else the planner default.
pub fn quality_threshold(config: &PlannerConfig, service: Option<&ServiceProfile>) -> f64 {
    service
        .map(|s| s.min_sinr_db)
        .unwrap_or(config.min_quality_db)
}

/// Cells at `waypoint` meeting the scorer's threshold, in map order.
///
/// Returns an empty list when nothing qualifies; the optimizer decides what
/// that means for the path.
pub fn generate_candidates<M: RadioMapProvider + ?Sized>(
    radio_map: &M,
    waypoint: &Waypoint,
    scorer: &UtilityScorer,
) -> Vec<Candidate> {
    radio_map
        .cells_at(waypoint)
        .into_iter()
        .filter(|(_, metric)| {
            metric.sinr_db.is_finite()
                && metric.load.is_finite()
                && metric.sinr_db >= scorer.threshold_db
        })
        .map(|(cell_id, metric)| Candidate {
            utility: scorer.utility(metric.sinr_db, metric.load),
            cell_id,
            metric,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RadioMap;

    #[test]
    fn filters_on_inclusive_threshold() {
        let map = RadioMap::new()
            .with_cell(0, "cell-A", CellMetric::new(-3.0, 0.2))
            .with_cell(0, "cell-B", CellMetric::new(-3.5, 0.1))
            .with_cell(0, "cell-C", CellMetric::new(4.0, 0.9));
        let service = ServiceProfile::new("uav-hd-video", 10e6, -3.0);
        let scorer = UtilityScorer::new(&PlannerConfig::default(), Some(&service));

        let ids: Vec<String> = generate_candidates(&map, &Waypoint::new(0, 0.0, 0.0, 50.0), &scorer)
            .into_iter()
            .map(|c| c.cell_id)
            .collect();
        assert_eq!(ids, vec!["cell-A", "cell-C"]);
    }

    #[test]
    fn empty_when_nothing_qualifies() {
        let map = RadioMap::new().with_cell(0, "cell-A", CellMetric::new(-20.0, 0.1));
        let scorer = UtilityScorer::new(&PlannerConfig::default(), None);
        assert!(generate_candidates(&map, &Waypoint::new(0, 0.0, 0.0, 0.0), &scorer).is_empty());
    }

    #[test]
    fn utility_prefers_quality_and_penalizes_load() {
        let scorer = UtilityScorer::new(&PlannerConfig::default(), None);
        // 10 dB over the -5 dB floor is one quality unit
        assert!((scorer.utility(5.0, 0.0) - 1.0).abs() < 1e-12);
        assert!((scorer.utility(5.0, 1.0) - 0.5).abs() < 1e-12);
        assert!(scorer.utility(2.0, 0.1) > scorer.utility(1.0, 0.1));
        assert_eq!(scorer.utility(2.0, 0.4), scorer.utility(2.0, 0.4));
    }
}
