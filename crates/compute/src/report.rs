//! Response shapes of the five operations. Field names are camelCase on the wire.

use chrono::NaiveDate;
use serde::Serialize;

use carepulse_core::{Pattern, TrendDirection};

use crate::adherence::AdherenceTrend;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySummary {
    pub date: NaiveDate,
    pub patient_id: String,
    pub insights: Vec<String>,
    pub concerns: Vec<String>,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklySummary {
    pub patient_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Adherence rate over the window, 0–100.
    pub medication_adherence: f64,
    pub symptom_trends: SymptomTrendSummary,
    pub missed_events: u32,
    pub insights: Vec<String>,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SymptomTrendSummary {
    pub average_severity: f64,
    pub trend: TrendDirection,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SymptomPatternReport {
    pub patient_id: String,
    pub patterns: Vec<Pattern>,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentSuggestionReport {
    pub patient_id: String,
    pub suggestions: Vec<String>,
    pub checklist: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdherenceReport {
    pub patient_id: String,
    pub adherence_rate: f64,
    pub missed_doses: u32,
    pub late_doses: u32,
    pub trends: AdherenceTrend,
    pub insights: Vec<String>,
    pub recommendations: Vec<String>,
}
