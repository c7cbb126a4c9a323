//! REST API routes.

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    middleware,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use uav_core::{decide, ResourceDecision};

use super::indication::{DecisionResponse, IndicationRequest, ParsedIndication, SimIndication, SimResponse};
use super::{api_error, bad_request, plans, request_id, ApiError};
use crate::state::AppState;

const DEFAULT_DECISION_LIMIT: usize = 100;
const MAX_DECISION_LIMIT: usize = 1000;

/// Create the API router.
pub fn create_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health))
        .route("/e2/indication", post(handle_indication))
        .route("/api/v1/e2/indication", post(handle_sim_indication))
        .route("/decisions", get(list_decisions))
        .route("/stats", get(stats))
        .route("/v1/plans", post(plans::create_plan))
        .route(
            "/v1/plans/:uav_id",
            get(plans::get_plan)
                .put(plans::put_plan)
                .delete(plans::delete_plan),
        )
        .fallback(not_found)
        .layer(middleware::from_fn(request_id::ensure_request_id))
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "uav-policy",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

async fn not_found() -> ApiError {
    api_error(StatusCode::NOT_FOUND, "Endpoint not found")
}

/// Run the decision engine and record the outcome. An inline plan takes
/// precedence over the stored one.
fn run_decision(state: &AppState, parsed: &ParsedIndication) -> Result<ResourceDecision, ApiError> {
    let stored_plan = match parsed.plan {
        Some(_) => None,
        None => state.get_plan(&parsed.uav.uav_id),
    };
    let plan = parsed.plan.as_ref().or(stored_plan.as_ref());

    let decision = decide(
        &parsed.uav,
        &parsed.radio,
        plan,
        parsed.service.as_ref(),
        &state.config().policy,
    )
    .map_err(|e| {
        tracing::warn!("Invalid indication data for {}: {}", parsed.uav.uav_id, e);
        bad_request(format!("Invalid indication data: {}", e))
    })?;

    state.record_decision(&decision);
    Ok(decision)
}

async fn handle_indication(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<IndicationRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(request) = payload.map_err(|e| {
        tracing::warn!("Rejected indication: {}", e.body_text());
        bad_request(format!("Invalid indication data: {}", e.body_text()))
    })?;

    let parsed = request.into_parsed();
    tracing::info!("Processing indication for UAV: {}", parsed.uav.uav_id);

    let decision = run_decision(&state, &parsed)?;
    tracing::info!(
        "Decision for {}: cell={}, prb={:?}, reason={}",
        decision.uav_id,
        decision.target_cell_id,
        decision.prb_quota,
        decision.reason
    );

    let response = DecisionResponse::new(&decision, Utc::now().to_rfc3339());
    Ok(Json(json!(response)))
}

async fn handle_sim_indication(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SimIndication>, JsonRejection>,
) -> Result<Json<SimResponse>, ApiError> {
    let Json(indication) = payload.map_err(|e| {
        tracing::warn!("Rejected simulator indication: {}", e.body_text());
        bad_request(format!("Invalid indication data: {}", e.body_text()))
    })?;

    let (uav, radio) = indication.to_native();
    tracing::info!(
        "Simulation indication: UE={}, cell={}, RSRP={:.1} dBm",
        uav.uav_id,
        radio.serving_cell_id,
        radio.rsrp_serving
    );

    let parsed = ParsedIndication {
        uav,
        radio,
        plan: None,
        service: None,
    };
    let decision = run_decision(&state, &parsed)?;
    let response = SimResponse::new(&decision, &parsed.radio.serving_cell_id, Utc::now().to_rfc3339());
    tracing::info!(
        "Decision: action={:?}, target_cell={}, prb={:?}",
        response.action,
        decision.target_cell_id,
        decision.prb_quota
    );
    Ok(Json(response))
}

#[derive(Debug, Deserialize)]
struct DecisionsQuery {
    limit: Option<i64>,
}

fn clamp_limit(limit: Option<i64>) -> usize {
    match limit {
        Some(limit) => limit.clamp(1, MAX_DECISION_LIMIT as i64) as usize,
        None => DEFAULT_DECISION_LIMIT,
    }
}

async fn list_decisions(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DecisionsQuery>,
) -> Json<Value> {
    let decisions = state.recent_decisions(clamp_limit(query.limit));
    Json(json!({
        "count": decisions.len(),
        "decisions": decisions,
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

async fn stats(State(state): State<Arc<AppState>>) -> Json<Value> {
    let uav_list = state.unique_uavs();
    Json(json!({
        "total_decisions": state.decision_count(),
        "unique_uavs": uav_list.len(),
        "uav_list": uav_list,
        "stored_plans": state.plan_count(),
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decision_limit_is_clamped() {
        assert_eq!(clamp_limit(None), 100);
        assert_eq!(clamp_limit(Some(0)), 1);
        assert_eq!(clamp_limit(Some(-5)), 1);
        assert_eq!(clamp_limit(Some(50)), 50);
        assert_eq!(clamp_limit(Some(5000)), 1000);
    }
}
