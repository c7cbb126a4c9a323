//! Planning scenarios: a UAV path with the radio map predicted along it.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use uav_core::{CellMetric, RadioMap, ServiceProfile, Waypoint};

/// Input to the offline planner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub uav_id: String,
    pub waypoints: Vec<Waypoint>,
    pub radio_map: RadioMap,
    #[serde(default)]
    pub service_profile: Option<ServiceProfile>,
}

impl Scenario {
    /// Read a scenario from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scenario {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse scenario {}", path.display()))
    }

    /// HD video uplink service used by the demo scenarios.
    pub fn hd_video() -> ServiceProfile {
        ServiceProfile::new("uav-hd-video", 10e6, -3.0)
    }

    /// Four-waypoint climb where cell-B overtakes cell-A after the first leg.
    pub fn demo() -> Self {
        let waypoints = vec![
            Waypoint::new(0, 0.0, 0.0, 50.0),
            Waypoint::new(1, 50.0, 0.0, 60.0),
            Waypoint::new(2, 100.0, 20.0, 80.0),
            Waypoint::new(3, 150.0, 40.0, 90.0),
        ];
        let radio_map = RadioMap::new()
            .with_cell(0, "cell-A", CellMetric::new(-2.0, 0.3))
            .with_cell(0, "cell-B", CellMetric::new(-4.0, 0.1))
            .with_cell(1, "cell-A", CellMetric::new(0.0, 0.5))
            .with_cell(1, "cell-B", CellMetric::new(2.0, 0.2))
            .with_cell(2, "cell-A", CellMetric::new(-1.0, 0.7))
            .with_cell(2, "cell-B", CellMetric::new(3.0, 0.4))
            .with_cell(3, "cell-A", CellMetric::new(-3.0, 0.6))
            .with_cell(3, "cell-B", CellMetric::new(1.0, 0.3));

        Self {
            uav_id: "uav-001".to_string(),
            waypoints,
            radio_map,
            service_profile: Some(Self::hd_video()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use uav_core::{compute_plan, PlannerConfig};

    #[test]
    fn demo_plans_a_single_handover() {
        let scenario = Scenario::demo();
        let plan = compute_plan(
            &scenario.uav_id,
            &scenario.waypoints,
            &scenario.radio_map,
            scenario.service_profile.as_ref(),
            &PlannerConfig::default(),
        )
        .unwrap();

        let cells: Vec<&str> = plan
            .segments
            .iter()
            .map(|s| s.planned_cell_id.as_str())
            .collect();
        assert_eq!(cells, vec!["cell-A", "cell-B"]);
        assert!(plan.is_valid());
        assert!(plan.segments.iter().all(|s| s.slice_id.as_deref() == Some("uav-hd-video")));
    }

    #[test]
    fn load_reads_json_scenarios() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let json = serde_json::to_string(&Scenario::demo()).unwrap();
        file.write_all(json.as_bytes()).unwrap();

        let loaded = Scenario::load(file.path()).unwrap();
        assert_eq!(loaded.uav_id, "uav-001");
        assert_eq!(loaded.waypoints.len(), 4);
        assert_eq!(loaded.radio_map, Scenario::demo().radio_map);
    }

    #[test]
    fn load_reports_missing_files() {
        let err = Scenario::load(Path::new("/nonexistent/scenario.json")).unwrap_err();
        assert!(err.to_string().contains("Failed to read scenario"));
    }
}
