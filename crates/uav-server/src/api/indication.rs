//! E2 indication payloads and their conversion into decision inputs.
//!
//! Two wire formats are accepted: the native indication (a UAV state plus a
//! radio snapshot, optionally with an inline flight plan and service profile)
//! and the simulator's KPM report. Optional sections that fail to parse are
//! logged and dropped rather than failing the whole indication.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use uav_core::{
    FlightPlanPolicy, PathSegmentPlan, Position, RadioSnapshot, ResourceDecision, ServiceProfile,
    UavState,
};

/// Best-neighbor RSRP assumed when a report lists no neighbors.
pub const NO_NEIGHBOR_RSRP_DBM: f64 = -140.0;

const DEFAULT_UAV_ID: &str = "unknown";

/// Native indication body for `POST /e2/indication`.
#[derive(Debug, Clone, Deserialize)]
pub struct IndicationRequest {
    #[serde(default)]
    pub uav_id: Option<String>,
    pub position: Position,
    #[serde(default)]
    pub path_position: Option<Value>,
    #[serde(default)]
    pub slice_id: Option<String>,
    pub radio_snapshot: RadioSnapshot,
    #[serde(default)]
    pub flight_plan: Option<Value>,
    #[serde(default)]
    pub service_profile: Option<Value>,
}

/// Decision inputs extracted from an indication.
#[derive(Debug, Clone)]
pub struct ParsedIndication {
    pub uav: UavState,
    pub radio: RadioSnapshot,
    pub plan: Option<FlightPlanPolicy>,
    pub service: Option<ServiceProfile>,
}

impl IndicationRequest {
    pub fn into_parsed(self) -> ParsedIndication {
        let uav_id = self
            .uav_id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_UAV_ID.to_string());

        let path_position = self.path_position.as_ref().and_then(|raw| {
            let parsed = parse_path_position(raw);
            if parsed.is_none() {
                tracing::warn!("Invalid path_position for {}: {}", uav_id, raw);
            }
            parsed
        });

        let plan = self.flight_plan.and_then(|raw| match parse_flight_plan(raw, &uav_id) {
            Ok(plan) => {
                tracing::debug!("Parsed flight plan for {}", uav_id);
                Some(plan)
            }
            Err(e) => {
                tracing::warn!("Failed to parse flight plan for {}: {}", uav_id, e);
                None
            }
        });

        let service = self.service_profile.and_then(|raw| match parse_service_profile(raw) {
            Ok(service) => {
                tracing::debug!("Parsed service profile: {}", service.name);
                Some(service)
            }
            Err(e) => {
                tracing::warn!("Failed to parse service profile for {}: {}", uav_id, e);
                None
            }
        });

        ParsedIndication {
            uav: UavState {
                uav_id,
                position: self.position,
                slice_id: self.slice_id,
                path_position,
            },
            radio: self.radio_snapshot,
            plan,
            service,
        }
    }
}

/// Accepts a JSON number or a numeric string.
fn parse_path_position(raw: &Value) -> Option<f64> {
    match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[derive(Debug, Deserialize)]
struct FlightPlanPayload {
    #[serde(default)]
    uav_id: Option<String>,
    segments: Vec<PathSegmentPlan>,
}

/// An inline plan without `uav_id` belongs to the reporting UAV.
pub fn parse_flight_plan(raw: Value, uav_id: &str) -> Result<FlightPlanPolicy, serde_json::Error> {
    let payload: FlightPlanPayload = serde_json::from_value(raw)?;
    Ok(FlightPlanPolicy {
        uav_id: payload.uav_id.unwrap_or_else(|| uav_id.to_string()),
        segments: payload.segments,
    })
}

/// Service profile as sent on the wire. The bitrate may be given in either
/// bits or megabits per second; bits win when both are present.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceProfilePayload {
    pub name: String,
    #[serde(default)]
    pub target_bitrate_bps: Option<f64>,
    #[serde(default)]
    pub target_bitrate_mbps: Option<f64>,
    #[serde(default)]
    pub min_sinr_db: f64,
}

impl ServiceProfilePayload {
    pub fn into_profile(self) -> Result<ServiceProfile, String> {
        let bitrate_bps = match (self.target_bitrate_bps, self.target_bitrate_mbps) {
            (Some(bps), _) => bps,
            (None, Some(mbps)) => mbps * 1e6,
            (None, None) => return Err("missing target_bitrate_bps or target_bitrate_mbps".into()),
        };
        Ok(ServiceProfile::new(self.name, bitrate_bps, self.min_sinr_db))
    }
}

pub fn parse_service_profile(raw: Value) -> Result<ServiceProfile, String> {
    serde_json::from_value::<ServiceProfilePayload>(raw)
        .map_err(|e| e.to_string())?
        .into_profile()
}

/// Native decision response: the decision plus the time it was made.
#[derive(Debug, Serialize)]
pub struct DecisionResponse<'a> {
    pub uav_id: &'a str,
    pub target_cell_id: &'a str,
    pub slice_id: Option<&'a str>,
    pub prb_quota: Option<u32>,
    pub reason: &'a str,
    pub timestamp: String,
}

impl<'a> DecisionResponse<'a> {
    pub fn new(decision: &'a ResourceDecision, timestamp: String) -> Self {
        Self {
            uav_id: &decision.uav_id,
            target_cell_id: &decision.target_cell_id,
            slice_id: decision.slice_id.as_deref(),
            prb_quota: decision.prb_quota,
            reason: &decision.reason,
            timestamp,
        }
    }
}

// ---------------------------------------------------------------------------
// Simulator KPM format
// ---------------------------------------------------------------------------

/// Cell identifier that the simulator may send as a number or a string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellRef {
    Numeric(i64),
    Named(String),
}

impl Default for CellRef {
    fn default() -> Self {
        CellRef::Numeric(1)
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellRef::Numeric(id) => write!(f, "{}", id),
            CellRef::Named(id) => f.write_str(id),
        }
    }
}

impl CellRef {
    /// Numeric ids travel back to the simulator as numbers.
    pub fn from_cell_id(cell_id: &str) -> Self {
        if !cell_id.is_empty() && cell_id.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(id) = cell_id.parse() {
                return CellRef::Numeric(id);
            }
        }
        CellRef::Named(cell_id.to_string())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimMeasurements {
    pub rsrp_serving_dbm: f64,
    pub sinr_db: Option<f64>,
    pub prb_utilization: f64,
}

impl Default for SimMeasurements {
    fn default() -> Self {
        Self {
            rsrp_serving_dbm: -100.0,
            sinr_db: None,
            prb_utilization: 0.5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SimNeighbor {
    #[serde(default = "unknown_neighbor")]
    pub cell_id: CellRef,
    #[serde(default = "no_neighbor_rsrp")]
    pub rsrp: f64,
}

fn unknown_neighbor() -> CellRef {
    CellRef::Numeric(0)
}

fn no_neighbor_rsrp() -> f64 {
    NO_NEIGHBOR_RSRP_DBM
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimPosition {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Default for SimPosition {
    fn default() -> Self {
        Self { x: 0.0, y: 0.0, z: 100.0 }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SimUeContext {
    #[serde(default)]
    pub position: SimPosition,
}

/// Simulator indication body for `POST /api/v1/e2/indication`.
#[derive(Debug, Clone, Deserialize)]
pub struct SimIndication {
    #[serde(default = "default_ue_id")]
    pub ue_id: String,
    #[serde(default)]
    pub cell_id: CellRef,
    #[serde(default)]
    pub measurements: SimMeasurements,
    #[serde(default)]
    pub neighbor_cells: Vec<SimNeighbor>,
    #[serde(default)]
    pub ue_context: SimUeContext,
}

fn default_ue_id() -> String {
    "UAV-001".to_string()
}

impl SimIndication {
    /// Convert to native inputs. Neighbors are ordered by RSRP, strongest first.
    pub fn to_native(&self) -> (UavState, RadioSnapshot) {
        let mut neighbors: Vec<&SimNeighbor> = self.neighbor_cells.iter().collect();
        neighbors.sort_by(|a, b| b.rsrp.total_cmp(&a.rsrp));

        let rsrp_best_neighbor = neighbors
            .first()
            .map(|n| n.rsrp)
            .unwrap_or(NO_NEIGHBOR_RSRP_DBM);

        let position = &self.ue_context.position;
        let uav = UavState::new(self.ue_id.clone(), position.x, position.y, position.z);
        let radio = RadioSnapshot {
            serving_cell_id: self.cell_id.to_string(),
            neighbor_cell_ids: neighbors.iter().map(|n| n.cell_id.to_string()).collect(),
            rsrp_serving: self.measurements.rsrp_serving_dbm,
            rsrp_best_neighbor,
            prb_utilization_serving: self.measurements.prb_utilization,
            prb_utilization_slice: None,
            sinr_db: self.measurements.sinr_db,
        };
        (uav, radio)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SimAction {
    Handover,
    PrbAllocation,
    NoAction,
}

impl SimAction {
    pub fn classify(decision: &ResourceDecision, serving_cell_id: &str) -> Self {
        if decision.is_handover(serving_cell_id) {
            SimAction::Handover
        } else if decision.prb_quota.is_some_and(|quota| quota > 0) {
            SimAction::PrbAllocation
        } else {
            SimAction::NoAction
        }
    }
}

/// Control response returned to the simulator.
#[derive(Debug, Serialize)]
pub struct SimResponse {
    pub action: SimAction,
    pub target_cell_id: CellRef,
    pub allocated_prbs: Option<u32>,
    pub reason: String,
    pub timestamp: String,
}

impl SimResponse {
    pub fn new(decision: &ResourceDecision, serving_cell_id: &str, timestamp: String) -> Self {
        Self {
            action: SimAction::classify(decision, serving_cell_id),
            target_cell_id: CellRef::from_cell_id(&decision.target_cell_id),
            allocated_prbs: decision.prb_quota,
            reason: decision.reason.clone(),
            timestamp,
        }
    }
}
