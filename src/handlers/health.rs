use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::json;

use super::AppState;

/// Health check endpoint
/// Returns 200 OK while the process is serving, with the size of the current table
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let summary = state.store.current_table().summary();
    (StatusCode::OK, Json(json!({
        "status": "healthy",
        "service": "ec2-price",
        "version": env!("CARGO_PKG_VERSION"),
        "regions": summary.regions,
        "instance_types": summary.instance_types,
    })))
}
