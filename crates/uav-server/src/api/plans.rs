//! Flight-plan store endpoints.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use uav_core::{compute_plan, FlightPlanPolicy, PathSegmentPlan, PlannerConfig, RadioMap, Waypoint};

use super::indication::ServiceProfilePayload;
use super::{api_error, bad_request, ApiError};
use crate::state::AppState;

/// Body for `POST /v1/plans`: everything the offline planner needs.
#[derive(Debug, Deserialize)]
pub struct PlanRequest {
    pub uav_id: String,
    pub waypoints: Vec<Waypoint>,
    pub radio_map: RadioMap,
    #[serde(default)]
    pub service_profile: Option<ServiceProfilePayload>,
    #[serde(default)]
    pub planner: Option<PlannerConfig>,
}

/// Body for `PUT /v1/plans/:uav_id`.
#[derive(Debug, Deserialize)]
pub struct StorePlanRequest {
    #[serde(default)]
    pub uav_id: Option<String>,
    pub segments: Vec<PathSegmentPlan>,
}

/// Compute a plan from a path and radio map, then store it for the UAV.
pub async fn create_plan(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<PlanRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<FlightPlanPolicy>), ApiError> {
    let Json(request) = payload.map_err(|e| bad_request(e.body_text()))?;

    if request.uav_id.trim().is_empty() {
        return Err(bad_request("uav_id is required"));
    }

    let service = request
        .service_profile
        .map(ServiceProfilePayload::into_profile)
        .transpose()
        .map_err(bad_request)?;
    let planner = request.planner.unwrap_or_default();

    let plan = compute_plan(
        &request.uav_id,
        &request.waypoints,
        &request.radio_map,
        service.as_ref(),
        &planner,
    )
    .map_err(|e| {
        tracing::warn!("Planning failed for {}: {}", request.uav_id, e);
        bad_request(e.to_string())
    })?;

    tracing::info!(
        "Computed plan for {}: {} waypoints, {} segments",
        plan.uav_id,
        request.waypoints.len(),
        plan.segments.len()
    );
    state.store_plan(plan.clone());
    Ok((StatusCode::CREATED, Json(plan)))
}

/// Store an externally computed plan, replacing any previous one.
pub async fn put_plan(
    State(state): State<Arc<AppState>>,
    Path(uav_id): Path<String>,
    payload: Result<Json<StorePlanRequest>, JsonRejection>,
) -> Result<Json<FlightPlanPolicy>, ApiError> {
    let Json(request) = payload.map_err(|e| bad_request(e.body_text()))?;

    if let Some(body_uav_id) = request.uav_id.as_deref() {
        if body_uav_id != uav_id {
            return Err(bad_request(format!(
                "plan uav_id {} does not match path {}",
                body_uav_id, uav_id
            )));
        }
    }

    let plan = FlightPlanPolicy {
        uav_id,
        segments: request.segments,
    };
    let violations = plan.validate();
    if !violations.is_empty() {
        return Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(serde_json::json!({
                "error": "Invalid flight plan",
                "violations": violations,
            })),
        ));
    }

    if state.store_plan(plan.clone()).is_some() {
        tracing::info!("Replaced plan for {}", plan.uav_id);
    } else {
        tracing::info!("Stored plan for {}", plan.uav_id);
    }
    Ok(Json(plan))
}

pub async fn get_plan(
    State(state): State<Arc<AppState>>,
    Path(uav_id): Path<String>,
) -> Result<Json<FlightPlanPolicy>, ApiError> {
    state
        .get_plan(&uav_id)
        .map(Json)
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, format!("No plan for {}", uav_id)))
}

pub async fn delete_plan(
    State(state): State<Arc<AppState>>,
    Path(uav_id): Path<String>,
) -> StatusCode {
    match state.remove_plan(&uav_id) {
        Some(_) => {
            tracing::info!("Deleted plan for {}", uav_id);
            StatusCode::NO_CONTENT
        }
        None => StatusCode::NOT_FOUND,
    }
}
