//! Near-RT replay of a planned path.

use serde::{Deserialize, Serialize};

use uav_core::{path_progress, RadioMapProvider, RadioSnapshot, ResourceDecision, UavState, Waypoint};

use super::radio::serving_snapshot;

/// One indication of the replay: what the UAV reports at a waypoint.
#[derive(Debug, Clone)]
pub struct ReplayInput {
    pub step_index: usize,
    pub uav: UavState,
    pub radio: RadioSnapshot,
}

/// Walk `waypoints` in index order, building the state and snapshot the UAV
/// would report at each. Waypoints the map has no cells for are skipped.
pub fn replay_inputs<M: RadioMapProvider + ?Sized>(
    uav_id: &str,
    waypoints: &[Waypoint],
    map: &M,
    noise_floor_dbm: f64,
) -> Vec<ReplayInput> {
    let mut path: Vec<&Waypoint> = waypoints.iter().collect();
    path.sort_by_key(|wp| wp.index);
    let progress = path_progress(&path);

    path.iter()
        .zip(progress)
        .filter_map(|(wp, path_position)| {
            let Some(radio) = serving_snapshot(map, wp, noise_floor_dbm) else {
                tracing::warn!("No radio coverage at waypoint {}, skipping", wp.index);
                return None;
            };
            Some(ReplayInput {
                step_index: wp.index,
                uav: UavState::new(uav_id, wp.x, wp.y, wp.z).with_path_position(path_position),
                radio,
            })
        })
        .collect()
}

/// Decision fields shared by the local engine and the server response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionSummary {
    pub uav_id: String,
    pub target_cell_id: String,
    #[serde(default)]
    pub slice_id: Option<String>,
    #[serde(default)]
    pub prb_quota: Option<u32>,
    pub reason: String,
}

impl From<&ResourceDecision> for DecisionSummary {
    fn from(decision: &ResourceDecision) -> Self {
        Self {
            uav_id: decision.uav_id.clone(),
            target_cell_id: decision.target_cell_id.clone(),
            slice_id: decision.slice_id.clone(),
            prb_quota: decision.prb_quota,
            reason: decision.reason.clone(),
        }
    }
}

/// One JSONL line of the decision log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayRecord {
    pub step_index: usize,
    pub uav_id: String,
    pub decision: DecisionSummary,
}
