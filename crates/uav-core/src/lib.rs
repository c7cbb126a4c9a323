pub mod candidates;
pub mod capacity;
pub mod error;
pub mod models;
pub mod planner;
pub mod policy;
pub mod rules;

pub use candidates::{generate_candidates, quality_threshold, Candidate, UtilityScorer};
pub use capacity::{estimate_quota, spectral_efficiency};
pub use error::{PlanningError, ValidationError};
pub use models::{
    CellMetric, DecisionStep, FlightPlanPolicy, PathSegmentPlan, Position, RadioMap,
    RadioMapProvider, RadioSnapshot, ResourceDecision, ServiceProfile, UavState, Waypoint,
};
pub use planner::{compress_to_segments, compute_plan, optimize_cell_sequence, path_progress};
pub use policy::{decide, sinr_proxy};
pub use rules::{PlannerConfig, PolicyConfig};
