//! Core data models for the UAV resource-allocation engine.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Discretized waypoint along a UAV flight path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub index: usize,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Waypoint {
    pub fn new(index: usize, x: f64, y: f64, z: f64) -> Self {
        Self { index, x, y, z }
    }
}

/// Predicted radio metric for a cell at a given waypoint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CellMetric {
    pub sinr_db: f64,
    /// Expected PRB utilization in [0, 1]
    pub load: f64,
}

impl CellMetric {
    pub fn new(sinr_db: f64, load: f64) -> Self {
        Self { sinr_db, load }
    }
}

/// Source of predicted link quality along a path.
///
/// The planner only ever reads through this trait, so a propagation model,
/// a trace replay or a static table can all back it.
pub trait RadioMapProvider {
    /// Cells reachable at `waypoint` with their predicted metrics.
    fn cells_at(&self, waypoint: &Waypoint) -> Vec<(String, CellMetric)>;

    /// Predicted metric for a single cell at `waypoint`, if the map has one.
    fn quality(&self, waypoint: &Waypoint, cell_id: &str) -> Option<CellMetric> {
        self.cells_at(waypoint)
            .into_iter()
            .find(|(id, _)| id == cell_id)
            .map(|(_, metric)| metric)
    }
}

/// Static radio map indexed by waypoint index and cell id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RadioMap {
    pub metrics: BTreeMap<usize, BTreeMap<String, CellMetric>>,
}

impl RadioMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the metric of `cell_id` at waypoint `index`.
    pub fn insert(&mut self, index: usize, cell_id: impl Into<String>, metric: CellMetric) {
        self.metrics
            .entry(index)
            .or_default()
            .insert(cell_id.into(), metric);
    }

    pub fn with_cell(mut self, index: usize, cell_id: impl Into<String>, metric: CellMetric) -> Self {
        self.insert(index, cell_id, metric);
        self
    }
}

impl RadioMapProvider for RadioMap {
    fn cells_at(&self, waypoint: &Waypoint) -> Vec<(String, CellMetric)> {
        self.metrics
            .get(&waypoint.index)
            .map(|cells| {
                cells
                    .iter()
                    .map(|(id, metric)| (id.clone(), *metric))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn quality(&self, waypoint: &Waypoint, cell_id: &str) -> Option<CellMetric> {
        self.metrics
            .get(&waypoint.index)
            .and_then(|cells| cells.get(cell_id))
            .copied()
    }
}

/// Planned serving cell and resource profile for a path segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathSegmentPlan {
    pub start_pos: f64,
    pub end_pos: f64,
    pub planned_cell_id: String,
    #[serde(default)]
    pub slice_id: Option<String>,
    pub base_prb_quota: u32,
}

impl PathSegmentPlan {
    /// Whether `path_position` falls in `[start_pos, end_pos)`.
    pub fn contains(&self, path_position: f64) -> bool {
        self.start_pos <= path_position && path_position < self.end_pos
    }
}

/// Offline-derived flight-plan policy for a single UAV.
///
/// Computed once per flight intent and replaced wholesale when the intent
/// changes; nothing in this crate mutates a plan after it is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightPlanPolicy {
    pub uav_id: String,
    pub segments: Vec<PathSegmentPlan>,
}

impl FlightPlanPolicy {
    /// Locate the segment active at `path_position`.
    ///
    /// Segments are ordered and contiguous, so this is a binary search on
    /// `start_pos`. The final segment is closed at 1.0 so the end of the path
    /// still resolves to a segment.
    pub fn active_segment(&self, path_position: f64) -> Option<&PathSegmentPlan> {
        let idx = self
            .segments
            .partition_point(|seg| seg.start_pos <= path_position);
        let seg = self.segments.get(idx.checked_sub(1)?)?;
        let is_last = idx == self.segments.len();
        if seg.contains(path_position) || (is_last && path_position == seg.end_pos && seg.end_pos >= 1.0) {
            Some(seg)
        } else {
            None
        }
    }

    /// Check that segments are ordered, non-overlapping and cover [0, 1]
    /// with no gaps.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.uav_id.trim().is_empty() {
            errors.push("uav_id must not be empty".to_string());
        }
        let Some(first) = self.segments.first() else {
            errors.push("plan has no segments".to_string());
            return errors;
        };
        if first.start_pos != 0.0 {
            errors.push(format!("first segment starts at {} instead of 0", first.start_pos));
        }
        for (i, seg) in self.segments.iter().enumerate() {
            if !seg.start_pos.is_finite() || !seg.end_pos.is_finite() {
                errors.push(format!("segment {} has non-finite bounds", i));
                continue;
            }
            if !(0.0 <= seg.start_pos && seg.start_pos < seg.end_pos && seg.end_pos <= 1.0) {
                errors.push(format!(
                    "segment {} bounds [{}, {}) outside 0 <= start < end <= 1",
                    i, seg.start_pos, seg.end_pos
                ));
            }
            if seg.planned_cell_id.trim().is_empty() {
                errors.push(format!("segment {} has an empty planned_cell_id", i));
            }
            if let Some(next) = self.segments.get(i + 1) {
                if next.start_pos != seg.end_pos {
                    errors.push(format!(
                        "segment {} ends at {} but segment {} starts at {}",
                        i,
                        seg.end_pos,
                        i + 1,
                        next.start_pos
                    ));
                }
            }
        }
        if let Some(last) = self.segments.last() {
            if last.end_pos != 1.0 {
                errors.push(format!("last segment ends at {} instead of 1", last.end_pos));
            }
        }
        errors
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Minimal UAV state used by the policy engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UavState {
    pub uav_id: String,
    pub position: Position,
    #[serde(default)]
    pub slice_id: Option<String>,
    /// Normalized progress along the planned path in [0, 1]
    #[serde(default)]
    pub path_position: Option<f64>,
}

impl UavState {
    pub fn new(uav_id: impl Into<String>, x: f64, y: f64, z: f64) -> Self {
        Self {
            uav_id: uav_id.into(),
            position: Position { x, y, z },
            slice_id: None,
            path_position: None,
        }
    }

    pub fn with_path_position(mut self, path_position: f64) -> Self {
        self.path_position = Some(path_position);
        self
    }

    pub fn with_slice(mut self, slice_id: impl Into<String>) -> Self {
        self.slice_id = Some(slice_id.into());
        self
    }
}

/// Per-UAV view of the radio environment at one measurement instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RadioSnapshot {
    pub serving_cell_id: String,
    /// Ordered by descending measured quality
    #[serde(default)]
    pub neighbor_cell_ids: Vec<String>,
    pub rsrp_serving: f64,
    pub rsrp_best_neighbor: f64,
    pub prb_utilization_serving: f64,
    #[serde(default)]
    pub prb_utilization_slice: Option<f64>,
    /// Explicit SINR report; preferred over the RSRP proxy when present
    #[serde(default)]
    pub sinr_db: Option<f64>,
}

/// QoS profile for a UAV service (e.g. HD video uplink).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceProfile {
    pub name: String,
    pub target_bitrate_bps: f64,
    #[serde(default)]
    pub min_sinr_db: f64,
}

impl ServiceProfile {
    pub fn new(name: impl Into<String>, target_bitrate_bps: f64, min_sinr_db: f64) -> Self {
        Self {
            name: name.into(),
            target_bitrate_bps,
            min_sinr_db,
        }
    }
}

/// One branch taken while deciding, in evaluation order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum DecisionStep {
    /// Active segment plans the current serving cell
    PlanMatch { planned_cell_id: String },
    /// Active segment plans a different cell
    PlanMismatch { planned_cell_id: String },
    /// No plan, no path position, or no segment covering it
    NoActiveSegment,
    OverloadCheck { utilization: f64, threshold: f64, overloaded: bool },
    HysteresisCheck { advantage_db: f64, margin_db: f64, exceeded: bool },
    /// Reactive branch wanted to move but no neighbor was reported
    NoNeighbor,
    Handover { target_cell_id: String },
    Stay { cell_id: String },
    SliceFromUav { slice_id: String },
    SliceFromSegment { slice_id: String },
    SliceUnset,
    QuotaFromCapacity { service: String, sinr_db: f64, quota: u32 },
    QuotaFromSegment { quota: u32 },
    QuotaDefault { quota: u32 },
}

impl std::fmt::Display for DecisionStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecisionStep::PlanMatch { planned_cell_id } => {
                write!(f, "serving cell matches flight-plan cell {}", planned_cell_id)
            }
            DecisionStep::PlanMismatch { planned_cell_id } => {
                write!(f, "flight plan suggests cell {}", planned_cell_id)
            }
            DecisionStep::NoActiveSegment => {
                write!(f, "no active flight-plan segment, reactive policy only")
            }
            DecisionStep::OverloadCheck { utilization, threshold, overloaded } => write!(
                f,
                "serving utilization {:.1}% {} threshold {:.1}%",
                utilization * 100.0,
                if *overloaded { "above" } else { "within" },
                threshold * 100.0
            ),
            DecisionStep::HysteresisCheck { advantage_db, margin_db, exceeded } => write!(
                f,
                "neighbor advantage {:.3} dB {} hysteresis {:.3} dB",
                advantage_db,
                if *exceeded { "exceeds" } else { "does not exceed" },
                margin_db
            ),
            DecisionStep::NoNeighbor => write!(f, "no neighbor cell reported"),
            DecisionStep::Handover { target_cell_id } => {
                write!(f, "hand over to {}", target_cell_id)
            }
            DecisionStep::Stay { cell_id } => write!(f, "stay on serving cell {}", cell_id),
            DecisionStep::SliceFromUav { slice_id } => write!(f, "slice {} from UAV state", slice_id),
            DecisionStep::SliceFromSegment { slice_id } => {
                write!(f, "slice {} from flight-plan segment", slice_id)
            }
            DecisionStep::SliceUnset => write!(f, "no slice info, slice unset"),
            DecisionStep::QuotaFromCapacity { service, sinr_db, quota } => write!(
                f,
                "service {} at {:.1} dB SINR needs {} PRB",
                service, sinr_db, quota
            ),
            DecisionStep::QuotaFromSegment { quota } => {
                write!(f, "base quota {} PRB from flight-plan segment", quota)
            }
            DecisionStep::QuotaDefault { quota } => write!(f, "default quota {} PRB", quota),
        }
    }
}

/// Resource decision for one UAV indication.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceDecision {
    pub uav_id: String,
    pub target_cell_id: String,
    pub slice_id: Option<String>,
    pub prb_quota: Option<u32>,
    /// Human-readable rendering of `trace`, for auditing
    pub reason: String,
    #[serde(default)]
    pub trace: Vec<DecisionStep>,
}

impl ResourceDecision {
    /// Whether the decision moves the UAV off `serving_cell_id`.
    pub fn is_handover(&self, serving_cell_id: &str) -> bool {
        self.target_cell_id != serving_cell_id
    }
}
