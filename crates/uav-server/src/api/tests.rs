use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use crate::{api, config::Config, state::AppState};

fn setup_app() -> (axum::Router, Arc<AppState>) {
    let state = Arc::new(AppState::new(Config::default()));
    let app = api::routes().with_state(state.clone());
    (app, state)
}

async fn read_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("parse json")
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn indication(uav_id: &str, utilization: f64, rsrp_serving: f64, rsrp_neighbor: f64) -> Value {
    json!({
        "uav_id": uav_id,
        "position": {"x": 100.0, "y": 0.0, "z": 120.0},
        "radio_snapshot": {
            "serving_cell_id": "cell-A",
            "neighbor_cell_ids": ["cell-B"],
            "rsrp_serving": rsrp_serving,
            "rsrp_best_neighbor": rsrp_neighbor,
            "prb_utilization_serving": utilization
        }
    })
}

fn two_segment_plan(uav_id: &str) -> Value {
    json!({
        "uav_id": uav_id,
        "segments": [
            {"start_pos": 0.0, "end_pos": 0.5, "planned_cell_id": "cell-A", "slice_id": "uav-video", "base_prb_quota": 20},
            {"start_pos": 0.5, "end_pos": 1.0, "planned_cell_id": "cell-B", "slice_id": "uav-video", "base_prb_quota": 30}
        ]
    })
}

#[tokio::test]
async fn health_reports_healthy() {
    let (app, _state) = setup_app();
    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    let body = read_json(response).await;
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn request_id_is_echoed() {
    let (app, _state) = setup_app();
    let request = Request::builder()
        .uri("/health")
        .header("x-request-id", "e2-msg-7")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.headers()["x-request-id"], "e2-msg-7");
}

#[tokio::test]
async fn reactive_handover_on_overload() {
    let (app, state) = setup_app();
    let response = app
        .oneshot(post_json("/e2/indication", indication("uav-001", 0.9, -95.0, -88.0)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["uav_id"], "uav-001");
    assert_eq!(body["target_cell_id"], "cell-B");
    assert_eq!(body["prb_quota"], 5);
    assert!(body["timestamp"].is_string());
    assert_eq!(state.decision_count(), 1);
}

#[tokio::test]
async fn inline_plan_drives_handover_and_quota() {
    let (app, _state) = setup_app();
    let mut body = indication("uav-001", 0.85, -95.0, -90.0);
    body["path_position"] = json!(0.75);
    body["flight_plan"] = two_segment_plan("uav-001");

    let response = app.oneshot(post_json("/e2/indication", body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["target_cell_id"], "cell-B");
    assert_eq!(body["slice_id"], "uav-video");
    assert_eq!(body["prb_quota"], 30);
}

#[tokio::test]
async fn stored_plan_is_used_without_inline_plan() {
    let (app, _state) = setup_app();
    let put = Request::builder()
        .method("PUT")
        .uri("/v1/plans/uav-002")
        .header("content-type", "application/json")
        .body(Body::from(two_segment_plan("uav-002").to_string()))
        .unwrap();
    let response = app.clone().oneshot(put).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let mut body = indication("uav-002", 0.2, -90.0, -95.0);
    body["path_position"] = json!(0.25);
    let response = app.oneshot(post_json("/e2/indication", body)).await.unwrap();
    let body = read_json(response).await;
    assert_eq!(body["target_cell_id"], "cell-A");
    assert_eq!(body["prb_quota"], 20);
    assert_eq!(body["slice_id"], "uav-video");
}

#[tokio::test]
async fn invalid_indication_is_rejected() {
    let (app, state) = setup_app();

    let response = app
        .clone()
        .oneshot(post_json("/e2/indication", json!({"uav_id": "uav-001"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(read_json(response).await["error"].is_string());

    let response = app
        .oneshot(post_json("/e2/indication", indication("uav-001", 1.5, -90.0, -95.0)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(state.decision_count(), 0);
}

#[tokio::test]
async fn sim_indication_reports_action() {
    let (app, _state) = setup_app();
    let response = app
        .oneshot(post_json(
            "/api/v1/e2/indication",
            json!({
                "ue_id": "UAV-001",
                "cell_id": 1,
                "measurements": {"rsrp_serving_dbm": -95.0, "prb_utilization": 0.9},
                "neighbor_cells": [{"cell_id": 3, "rsrp": -99.0}, {"cell_id": 2, "rsrp": -85.0}]
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["action"], "handover");
    assert_eq!(body["target_cell_id"], 2);
    assert_eq!(body["allocated_prbs"], 5);
}

#[tokio::test]
async fn sim_indication_without_neighbors_allocates() {
    let (app, _state) = setup_app();
    let response = app
        .oneshot(post_json("/api/v1/e2/indication", json!({"cell_id": 4})))
        .await
        .unwrap();
    let body = read_json(response).await;
    assert_eq!(body["action"], "prb_allocation");
    assert_eq!(body["target_cell_id"], 4);
}

#[tokio::test]
async fn decisions_and_stats_track_history() {
    let (app, _state) = setup_app();
    for uav in ["uav-b", "uav-a", "uav-b"] {
        let response = app
            .clone()
            .oneshot(post_json("/e2/indication", indication(uav, 0.3, -90.0, -92.0)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app.clone().oneshot(get("/decisions?limit=2")).await.unwrap();
    let body = read_json(response).await;
    assert_eq!(body["count"], 2);
    assert_eq!(body["decisions"][0]["uav_id"], "uav-b");
    assert_eq!(body["decisions"][1]["uav_id"], "uav-a");

    let response = app.clone().oneshot(get("/decisions?limit=0")).await.unwrap();
    assert_eq!(read_json(response).await["count"], 1);

    let response = app.oneshot(get("/stats")).await.unwrap();
    let body = read_json(response).await;
    assert_eq!(body["total_decisions"], 3);
    assert_eq!(body["unique_uavs"], 2);
    assert_eq!(body["uav_list"], json!(["uav-a", "uav-b"]));
}

#[tokio::test]
async fn create_plan_computes_and_stores() {
    let (app, state) = setup_app();
    let request = post_json(
        "/v1/plans",
        json!({
            "uav_id": "uav-009",
            "waypoints": [
                {"index": 0, "x": 0.0, "y": 0.0, "z": 100.0},
                {"index": 1, "x": 50.0, "y": 0.0, "z": 100.0},
                {"index": 2, "x": 100.0, "y": 0.0, "z": 100.0}
            ],
            "radio_map": {"metrics": {
                "0": {"cell-A": {"sinr_db": 10.0, "load": 0.2}},
                "1": {"cell-A": {"sinr_db": 8.0, "load": 0.2}},
                "2": {"cell-A": {"sinr_db": 6.0, "load": 0.2}}
            }},
            "service_profile": {"name": "uav-hd-video", "target_bitrate_mbps": 10.0, "min_sinr_db": -3.0}
        }),
    );
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = read_json(response).await;
    assert_eq!(body["uav_id"], "uav-009");
    assert_eq!(body["segments"].as_array().map(Vec::len), Some(1));
    assert_eq!(body["segments"][0]["planned_cell_id"], "cell-A");
    assert_eq!(state.plan_count(), 1);

    let response = app.clone().oneshot(get("/v1/plans/uav-009")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let delete = Request::builder()
        .method("DELETE")
        .uri("/v1/plans/uav-009")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(delete).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app.oneshot(get("/v1/plans/uav-009")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn computed_plan_covers_a_handover_at_the_last_waypoint() {
    let (app, _state) = setup_app();
    let request = post_json(
        "/v1/plans",
        json!({
            "uav_id": "uav-010",
            "waypoints": [
                {"index": 0, "x": 0.0, "y": 0.0, "z": 100.0},
                {"index": 1, "x": 50.0, "y": 0.0, "z": 100.0},
                {"index": 2, "x": 100.0, "y": 0.0, "z": 100.0}
            ],
            "radio_map": {"metrics": {
                "0": {"cell-A": {"sinr_db": 5.0, "load": 0.2}},
                "1": {"cell-A": {"sinr_db": 5.0, "load": 0.2}},
                "2": {"cell-B": {"sinr_db": 5.0, "load": 0.25}}
            }}
        }),
    );
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let plan = read_json(response).await;
    assert_eq!(plan["segments"][1]["planned_cell_id"], "cell-B");
    assert_eq!(plan["segments"][1]["start_pos"], 0.75);

    let mut body = indication("uav-010", 0.85, -95.0, -90.0);
    body["path_position"] = json!(1.0);
    let response = app.oneshot(post_json("/e2/indication", body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["target_cell_id"], "cell-B");
    assert_eq!(body["prb_quota"], 25);
}

#[tokio::test]
async fn create_plan_reports_planning_errors() {
    let (app, state) = setup_app();
    let request = post_json(
        "/v1/plans",
        json!({"uav_id": "uav-009", "waypoints": [], "radio_map": {"metrics": {}}}),
    );
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(read_json(response).await["error"].is_string());
    assert_eq!(state.plan_count(), 0);
}

#[tokio::test]
async fn put_plan_rejects_gapped_segments() {
    let (app, _state) = setup_app();
    let put = Request::builder()
        .method("PUT")
        .uri("/v1/plans/uav-003")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({"segments": [
                {"start_pos": 0.0, "end_pos": 0.4, "planned_cell_id": "cell-A", "slice_id": null, "base_prb_quota": 10},
                {"start_pos": 0.6, "end_pos": 1.0, "planned_cell_id": "cell-B", "slice_id": null, "base_prb_quota": 10}
            ]})
            .to_string(),
        ))
        .unwrap();
    let response = app.oneshot(put).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = read_json(response).await;
    assert!(body["violations"].as_array().is_some_and(|v| !v.is_empty()));
}

#[tokio::test]
async fn unknown_route_is_json_404() {
    let (app, _state) = setup_app();
    let response = app.oneshot(get("/nope")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(read_json(response).await["error"], "Endpoint not found");
}
