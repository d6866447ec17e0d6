//! The five insight operations. `now` defaults to the request's arrival time.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use chrono::Utc;

use carepulse_compute::request::{
    AdherenceRequest, AppointmentRequest, DailyRequest, PatternRequest, WeeklyRequest,
};
use carepulse_compute::{
    AdherenceReport, AppointmentSuggestionReport, DailySummary, SymptomPatternReport,
    WeeklySummary,
};

use crate::state::AppState;

use super::ApiResult;

pub async fn daily_summary(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<DailyRequest>, JsonRejection>,
) -> ApiResult<DailySummary> {
    let Json(req) = payload?;
    Ok(Json(req.run(&state.engine, Utc::now())?))
}

pub async fn weekly_summary(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<WeeklyRequest>, JsonRejection>,
) -> ApiResult<WeeklySummary> {
    let Json(req) = payload?;
    Ok(Json(req.run(&state.engine, Utc::now())?))
}

pub async fn symptom_patterns(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<PatternRequest>, JsonRejection>,
) -> ApiResult<SymptomPatternReport> {
    let Json(req) = payload?;
    Ok(Json(req.run(&state.engine, Utc::now())?))
}

pub async fn appointment_suggestions(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<AppointmentRequest>, JsonRejection>,
) -> ApiResult<AppointmentSuggestionReport> {
    let Json(req) = payload?;
    Ok(Json(req.run(&state.engine, Utc::now())?))
}

pub async fn adherence_analysis(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<AdherenceRequest>, JsonRejection>,
) -> ApiResult<AdherenceReport> {
    let Json(req) = payload?;
    Ok(Json(req.run(&state.engine, Utc::now())?))
}
