//! Error types surfaced by the two engine entry points.

use thiserror::Error;

/// The offline planner could not produce a feasible assignment.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlanningError {
    #[error("no waypoints to plan over")]
    EmptyPath,
    #[error("duplicate waypoint index {0}")]
    DuplicateWaypoint(usize),
    #[error("no eligible cell at first waypoint {index} (threshold {threshold_db} dB)")]
    NoFeasibleStart { index: usize, threshold_db: f64 },
    #[error("invalid planner config: {0}")]
    InvalidConfig(String),
    #[error("planned segments are inconsistent: {0}")]
    InvalidPlan(String),
}

/// Malformed or out-of-range input to the online decision engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("missing field: {0}")]
    MissingField(&'static str),
    #[error("{field} must be within [0, 1], got {value}")]
    OutOfRange { field: &'static str, value: f64 },
    #[error("{0} must be a finite number")]
    NonFinite(&'static str),
    #[error("target bitrate must be positive, got {0} bps")]
    InvalidBitrate(f64),
    #[error("flight plan belongs to {plan_uav_id}, not {uav_id}")]
    PlanOwnerMismatch { uav_id: String, plan_uav_id: String },
    #[error("invalid flight plan: {0}")]
    InvalidPlan(String),
    #[error("invalid policy config: {0}")]
    InvalidConfig(String),
}
