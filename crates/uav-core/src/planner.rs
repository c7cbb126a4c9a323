//! Offline flight-path cell planner.
//!
//! Chooses one serving cell per waypoint by dynamic programming over
//! (waypoint, cell) states, maximizing total utility minus a fixed penalty per
//! handover, then compresses the assignment into contiguous path segments.

use crate::candidates::{generate_candidates, Candidate, UtilityScorer};
use crate::error::PlanningError;
use crate::models::{FlightPlanPolicy, PathSegmentPlan, RadioMapProvider, ServiceProfile, Waypoint};
use crate::rules::PlannerConfig;
use std::collections::HashSet;

/// One DP layer: states at a waypoint, their best scores and back-pointers
/// into the previous layer.
#[derive(Debug, Clone)]
struct Layer {
    cells: Vec<String>,
    score: Vec<f64>,
    parent: Vec<usize>,
}

/// High-level entry point: waypoints + radio map -> flight-plan policy.
pub fn compute_plan<M: RadioMapProvider + ?Sized>(
    uav_id: &str,
    waypoints: &[Waypoint],
    radio_map: &M,
    service: Option<&ServiceProfile>,
    config: &PlannerConfig,
) -> Result<FlightPlanPolicy, PlanningError> {
    let errors = config.validate();
    if !errors.is_empty() {
        return Err(PlanningError::InvalidConfig(errors.join("; ")));
    }

    let path = sorted_path(waypoints)?;
    let scorer = UtilityScorer::new(config, service);
    let layers: Vec<Vec<Candidate>> = path
        .iter()
        .map(|wp| generate_candidates(radio_map, wp, &scorer))
        .collect();

    let cells = optimize_cell_sequence(&layers, config.handover_penalty).ok_or(
        PlanningError::NoFeasibleStart {
            index: path[0].index,
            threshold_db: scorer.threshold_db,
        },
    )?;

    let plan = compress_to_segments(uav_id, &path, &cells, radio_map, service, config);
    let violations = plan.validate();
    if !violations.is_empty() {
        return Err(PlanningError::InvalidPlan(violations.join("; ")));
    }
    Ok(plan)
}

/// Waypoints ordered by index, rejecting empty paths and repeated indices.
fn sorted_path(waypoints: &[Waypoint]) -> Result<Vec<&Waypoint>, PlanningError> {
    if waypoints.is_empty() {
        return Err(PlanningError::EmptyPath);
    }
    let mut seen = HashSet::new();
    for wp in waypoints {
        if !seen.insert(wp.index) {
            return Err(PlanningError::DuplicateWaypoint(wp.index));
        }
    }
    let mut path: Vec<&Waypoint> = waypoints.iter().collect();
    path.sort_by_key(|wp| wp.index);
    Ok(path)
}

/// Pick a cell per waypoint from per-waypoint candidate layers.
///
/// A waypoint with no candidates carries every state of the previous layer
/// forward unchanged, so the path keeps its last cell through coverage holes.
/// Among predecessors with equal score the one that avoids a handover wins;
/// remaining ties go to the earlier candidate. Returns `None` when the first
/// layer is empty.
pub fn optimize_cell_sequence(layers: &[Vec<Candidate>], handover_penalty: f64) -> Option<Vec<String>> {
    let first = layers.first().filter(|layer| !layer.is_empty())?;

    let mut table: Vec<Layer> = Vec::with_capacity(layers.len());
    table.push(Layer {
        cells: first.iter().map(|c| c.cell_id.clone()).collect(),
        score: first.iter().map(|c| c.utility).collect(),
        parent: vec![0; first.len()],
    });

    for candidates in &layers[1..] {
        let prev = &table[table.len() - 1];
        let next = if candidates.is_empty() {
            Layer {
                cells: prev.cells.clone(),
                score: prev.score.clone(),
                parent: (0..prev.cells.len()).collect(),
            }
        } else {
            let mut layer = Layer {
                cells: Vec::with_capacity(candidates.len()),
                score: Vec::with_capacity(candidates.len()),
                parent: Vec::with_capacity(candidates.len()),
            };
            for candidate in candidates {
                let mut best = f64::NEG_INFINITY;
                let mut best_parent = 0;
                for (p, prev_cell) in prev.cells.iter().enumerate() {
                    let stays = *prev_cell == candidate.cell_id;
                    let penalty = if stays { 0.0 } else { handover_penalty };
                    let score = prev.score[p] + candidate.utility - penalty;
                    if score > best || (score == best && stays) {
                        best = score;
                        best_parent = p;
                    }
                }
                layer.cells.push(candidate.cell_id.clone());
                layer.score.push(best);
                layer.parent.push(best_parent);
            }
            layer
        };
        table.push(next);
    }

    let last = &table[table.len() - 1];
    let mut idx = 0;
    for (k, score) in last.score.iter().enumerate() {
        if *score > last.score[idx] {
            idx = k;
        }
    }

    let mut chosen = vec![String::new(); table.len()];
    for i in (0..table.len()).rev() {
        chosen[i] = table[i].cells[idx].clone();
        idx = table[i].parent[idx];
    }
    Some(chosen)
}

/// Normalized progress of each waypoint of an index-sorted path.
pub fn path_progress(path: &[&Waypoint]) -> Vec<f64> {
    let (Some(first), Some(last)) = (path.first(), path.last()) else {
        return Vec::new();
    };
    let first = first.index;
    let span = last.index - first;
    if span == 0 {
        return vec![0.0; path.len()];
    }
    path.iter()
        .map(|wp| (wp.index - first) as f64 / span as f64)
        .collect()
}

/// Merge runs of waypoints sharing a cell into contiguous segments.
///
/// Adjacent runs meet halfway between the last waypoint of one and the first
/// waypoint of the next, the first segment starts at 0 and the last ends at 1.
/// Every run therefore has positive width and the segments tile [0, 1].
pub fn compress_to_segments<M: RadioMapProvider + ?Sized>(
    uav_id: &str,
    path: &[&Waypoint],
    cells: &[String],
    radio_map: &M,
    service: Option<&ServiceProfile>,
    config: &PlannerConfig,
) -> FlightPlanPolicy {
    let n = path.len().min(cells.len());
    if n == 0 {
        return FlightPlanPolicy {
            uav_id: uav_id.to_string(),
            segments: Vec::new(),
        };
    }

    let progress = path_progress(&path[..n]);
    let slice_id = service
        .map(|s| s.name.clone())
        .or_else(|| config.default_slice_id.clone());

    let mut segments = Vec::new();
    let mut run_start = 0;
    for i in 1..=n {
        if i < n && cells[i] == cells[run_start] {
            continue;
        }
        let start_pos = if run_start == 0 {
            0.0
        } else {
            midpoint(progress[run_start - 1], progress[run_start])
        };
        let end_pos = if i == n {
            1.0
        } else {
            midpoint(progress[i - 1], progress[i])
        };
        segments.push(PathSegmentPlan {
            start_pos,
            end_pos,
            planned_cell_id: cells[run_start].clone(),
            slice_id: slice_id.clone(),
            base_prb_quota: base_quota(&path[run_start..i], &cells[run_start], radio_map, config),
        });
        run_start = i;
    }

    FlightPlanPolicy {
        uav_id: uav_id.to_string(),
        segments,
    }
}

fn midpoint(a: f64, b: f64) -> f64 {
    a + (b - a) / 2.0
}

/// Quota proportional to the cell's average predicted load over the run.
fn base_quota<M: RadioMapProvider + ?Sized>(
    run: &[&Waypoint],
    cell_id: &str,
    radio_map: &M,
    config: &PlannerConfig,
) -> u32 {
    let loads: Vec<f64> = run
        .iter()
        .filter_map(|wp| radio_map.quality(wp, cell_id))
        .map(|metric| metric.load)
        .filter(|load| load.is_finite())
        .collect();
    let avg_load = if loads.is_empty() {
        0.0
    } else {
        loads.iter().sum::<f64>() / loads.len() as f64
    };
    (avg_load.max(0.0) * config.quota_per_unit_load)
        .ceil()
        .clamp(config.min_quota as f64, config.max_quota as f64) as u32
}
