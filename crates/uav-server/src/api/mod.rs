//! API routes for the UAV policy server.

pub mod indication;
pub mod plans;
pub mod request_id;
mod routes;

use axum::{http::StatusCode, Json, Router};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::state::AppState;

pub use routes::create_router;

pub fn routes() -> Router<Arc<AppState>> {
    create_router()
}

pub(crate) type ApiError = (StatusCode, Json<Value>);

pub(crate) fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(json!({ "error": message.into() })))
}

pub(crate) fn bad_request(message: impl Into<String>) -> ApiError {
    api_error(StatusCode::BAD_REQUEST, message)
}

#[cfg(test)]
mod tests;
