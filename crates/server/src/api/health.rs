//! Service status endpoint.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    pub calendar_offset_minutes: i32,
    pub recommendation_rules: usize,
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let config = state.engine.config();
    Json(HealthResponse {
        status: "ok",
        service: "CarePulse Insight Engine",
        version: env!("CARGO_PKG_VERSION"),
        calendar_offset_minutes: state.engine.calendar().offset_minutes(),
        recommendation_rules: config.recommendations.rules.len(),
    })
}
