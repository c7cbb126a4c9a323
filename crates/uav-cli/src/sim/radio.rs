//! Synthetic two-cell radio environment.
//!
//! cell-A covers the start of the corridor and fades out past x = 75 m while
//! cell-B takes over towards the end. Load is higher on cell-A in the far
//! half so the planner has a reason to move.

use uav_core::{CellMetric, RadioMap, RadioMapProvider, RadioSnapshot, Waypoint};

pub const CELL_A: &str = "cell-A";
pub const CELL_B: &str = "cell-B";

/// x coordinate where the two coverage patterns switch.
const CROSSOVER_X: f64 = 75.0;
const CORRIDOR_END_X: f64 = 150.0;

/// Metrics of both cells at a point of the corridor.
pub fn cell_metrics_at(x: f64) -> [(&'static str, CellMetric); 2] {
    if x <= CROSSOVER_X {
        [
            (CELL_A, CellMetric::new(0.02 * x, 0.4)),
            (CELL_B, CellMetric::new(-2.0 + 0.01 * x, 0.2)),
        ]
    } else {
        [
            (CELL_A, CellMetric::new(-2.0 + 0.01 * (CORRIDOR_END_X - x), 0.6)),
            (CELL_B, CellMetric::new(0.02 * (x - CROSSOVER_X), 0.3)),
        ]
    }
}

pub fn synthetic_radio_map(waypoints: &[Waypoint]) -> RadioMap {
    let mut map = RadioMap::new();
    for wp in waypoints {
        for (cell_id, metric) in cell_metrics_at(wp.x) {
            map.insert(wp.index, cell_id, metric);
        }
    }
    map
}

/// Straight corridor flight from x = 0 to x = 150 m at 100 m altitude.
pub fn demo_path() -> Vec<Waypoint> {
    (0..=6)
        .map(|i| Waypoint::new(i, 25.0 * i as f64, 0.0, 100.0))
        .collect()
}

/// Snapshot a UAV at `waypoint` would report.
///
/// The stronger cell serves (ties go to the first listed) and the rest are
/// neighbors, strongest first. RSRP is derived as SINR above `noise_floor_dbm`
/// so the decision engine's RSRP-based SINR proxy recovers the map's SINR.
pub fn serving_snapshot<M: RadioMapProvider + ?Sized>(
    map: &M,
    waypoint: &Waypoint,
    noise_floor_dbm: f64,
) -> Option<RadioSnapshot> {
    let mut cells = map.cells_at(waypoint);
    cells.sort_by(|a, b| b.1.sinr_db.total_cmp(&a.1.sinr_db));

    let mut cells = cells.into_iter();
    let (serving_cell_id, serving) = cells.next()?;
    let neighbors: Vec<(String, CellMetric)> = cells.collect();

    Some(RadioSnapshot {
        serving_cell_id,
        rsrp_serving: noise_floor_dbm + serving.sinr_db,
        rsrp_best_neighbor: neighbors
            .first()
            .map(|(_, metric)| noise_floor_dbm + metric.sinr_db)
            .unwrap_or(noise_floor_dbm),
        neighbor_cell_ids: neighbors.into_iter().map(|(cell_id, _)| cell_id).collect(),
        prb_utilization_serving: serving.load,
        prb_utilization_slice: None,
        sinr_db: None,
    })
}
