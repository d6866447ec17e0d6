//! Wire requests for the five operations.
//!
//! Timestamps arrive as strings and are decoded with one
//! [`TimestampParser`] per request, so a request mixing naive and aware
//! timestamps is rejected as a whole. `now` is optional on the wire; callers
//! supply the fallback instant.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use carepulse_core::time::parse_date;
use carepulse_core::{
    AppointmentEvent, AppointmentStatus, Calendar, DoseEvent, EventSet, InsightError, Result,
    SymptomReport, TimestampParser, MAX_SEVERITY,
};

use crate::engine::InsightEngine;
use crate::report::{
    AdherenceReport, AppointmentSuggestionReport, DailySummary, SymptomPatternReport,
    WeeklySummary,
};

// ── Event records ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoseRecord {
    pub medication_id: String,
    pub scheduled_time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub taken_time: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymptomRecord {
    pub time: String,
    #[serde(rename = "type")]
    pub symptom_type: String,
    /// Signed so out-of-range values surface as validation errors.
    pub severity: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentRecord {
    pub time: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doctor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

// ── Decoding ────────────────────────────────────────────────────────

struct Decoder {
    parser: TimestampParser,
}

impl Decoder {
    fn new(calendar: Calendar) -> Self {
        Self {
            parser: TimestampParser::new(calendar),
        }
    }

    fn doses(&mut self, records: &[DoseRecord]) -> Result<Vec<DoseEvent>> {
        records
            .iter()
            .enumerate()
            .map(|(i, r)| {
                let scheduled_time = self
                    .parser
                    .parse(&format!("medications[{i}].scheduledTime"), &r.scheduled_time)?;
                let taken_time = match &r.taken_time {
                    Some(raw) => Some(
                        self.parser
                            .parse(&format!("medications[{i}].takenTime"), raw)?,
                    ),
                    None => None,
                };
                Ok(DoseEvent {
                    medication_id: r.medication_id.clone(),
                    scheduled_time,
                    taken_time,
                })
            })
            .collect()
    }

    fn symptoms(&mut self, records: &[SymptomRecord]) -> Result<Vec<SymptomReport>> {
        records
            .iter()
            .enumerate()
            .map(|(i, r)| {
                let time = self.parser.parse(&format!("symptoms[{i}].time"), &r.time)?;
                let severity = u8::try_from(r.severity)
                    .ok()
                    .filter(|s| *s <= MAX_SEVERITY)
                    .ok_or_else(|| {
                        InsightError::invalid_input(format!(
                            "symptoms[{i}].severity {} is outside 0-{MAX_SEVERITY}",
                            r.severity
                        ))
                    })?;
                Ok(SymptomReport {
                    time,
                    symptom_type: r.symptom_type.clone(),
                    severity,
                    note: r.note.clone(),
                })
            })
            .collect()
    }

    fn appointments(&mut self, records: &[AppointmentRecord]) -> Result<Vec<AppointmentEvent>> {
        records
            .iter()
            .enumerate()
            .map(|(i, r)| {
                let time = self
                    .parser
                    .parse(&format!("appointments[{i}].time"), &r.time)?;
                let status = r.status.parse::<AppointmentStatus>().map_err(|e| {
                    InsightError::invalid_input(format!("appointments[{i}].status: {e}"))
                })?;
                Ok(AppointmentEvent {
                    time,
                    status,
                    notes: r.notes.clone(),
                    doctor: r.doctor.clone(),
                    reason: r.reason.clone(),
                })
            })
            .collect()
    }

    fn now(&mut self, raw: Option<&str>, fallback: DateTime<Utc>) -> Result<DateTime<Utc>> {
        match raw {
            Some(raw) => self.parser.parse("now", raw),
            None => Ok(fallback),
        }
    }

    fn events(
        &mut self,
        medications: &[DoseRecord],
        symptoms: &[SymptomRecord],
        appointments: &[AppointmentRecord],
    ) -> Result<EventSet> {
        Ok(EventSet {
            doses: self.doses(medications)?,
            symptoms: self.symptoms(symptoms)?,
            appointments: self.appointments(appointments)?,
        })
    }
}

// ── Requests ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyRequest {
    pub patient_id: String,
    pub date: String,
    #[serde(default)]
    pub medications: Vec<DoseRecord>,
    #[serde(default)]
    pub symptoms: Vec<SymptomRecord>,
    #[serde(default)]
    pub appointments: Vec<AppointmentRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub now: Option<String>,
}

impl DailyRequest {
    pub fn run(&self, engine: &InsightEngine, fallback_now: DateTime<Utc>) -> Result<DailySummary> {
        let date = parse_date("date", &self.date)?;
        let mut decoder = Decoder::new(*engine.calendar());
        let events = decoder.events(&self.medications, &self.symptoms, &self.appointments)?;
        let now = decoder.now(self.now.as_deref(), fallback_now)?;
        engine.daily_summary(&self.patient_id, date, &events, now)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyRequest {
    pub patient_id: String,
    pub start_date: String,
    pub end_date: String,
    #[serde(default)]
    pub medications: Vec<DoseRecord>,
    #[serde(default)]
    pub symptoms: Vec<SymptomRecord>,
    #[serde(default)]
    pub appointments: Vec<AppointmentRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub now: Option<String>,
}

impl WeeklyRequest {
    pub fn run(&self, engine: &InsightEngine, fallback_now: DateTime<Utc>) -> Result<WeeklySummary> {
        let start = parse_date("startDate", &self.start_date)?;
        let end = parse_date("endDate", &self.end_date)?;
        let mut decoder = Decoder::new(*engine.calendar());
        let events = decoder.events(&self.medications, &self.symptoms, &self.appointments)?;
        let now = decoder.now(self.now.as_deref(), fallback_now)?;
        engine.weekly_summary(&self.patient_id, start, end, &events, now)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternRequest {
    pub patient_id: String,
    #[serde(default)]
    pub symptoms: Vec<SymptomRecord>,
    /// Optional; enables the missed-dose correlation check.
    #[serde(default)]
    pub medications: Vec<DoseRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub now: Option<String>,
}

impl PatternRequest {
    pub fn run(
        &self,
        engine: &InsightEngine,
        fallback_now: DateTime<Utc>,
    ) -> Result<SymptomPatternReport> {
        let mut decoder = Decoder::new(*engine.calendar());
        let events = decoder.events(&self.medications, &self.symptoms, &[])?;
        let now = decoder.now(self.now.as_deref(), fallback_now)?;
        engine.detect_symptom_patterns(&self.patient_id, &events.symptoms, &events.doses, now)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentRequest {
    pub patient_id: String,
    #[serde(default, alias = "appointmentHistory")]
    pub appointments: Vec<AppointmentRecord>,
    #[serde(default)]
    pub symptoms: Vec<SymptomRecord>,
    #[serde(default)]
    pub medications: Vec<DoseRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub now: Option<String>,
}

impl AppointmentRequest {
    pub fn run(
        &self,
        engine: &InsightEngine,
        fallback_now: DateTime<Utc>,
    ) -> Result<AppointmentSuggestionReport> {
        let mut decoder = Decoder::new(*engine.calendar());
        let events = decoder.events(&self.medications, &self.symptoms, &self.appointments)?;
        let now = decoder.now(self.now.as_deref(), fallback_now)?;
        engine.appointment_suggestions(&self.patient_id, &events, now)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdherenceRequest {
    pub patient_id: String,
    #[serde(default, alias = "medicationHistory")]
    pub medications: Vec<DoseRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub now: Option<String>,
}

impl AdherenceRequest {
    pub fn run(&self, engine: &InsightEngine, fallback_now: DateTime<Utc>) -> Result<AdherenceReport> {
        let mut decoder = Decoder::new(*engine.calendar());
        let doses = decoder.doses(&self.medications)?;
        let now = decoder.now(self.now.as_deref(), fallback_now)?;
        engine.adherence_analysis(&self.patient_id, &doses, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fallback() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 6, 9, 0, 0).unwrap()
    }

    fn adherence(json: serde_json::Value) -> Result<AdherenceReport> {
        let req: AdherenceRequest = serde_json::from_value(json).unwrap();
        req.run(&InsightEngine::default(), fallback())
    }

    #[test]
    fn aware_timestamps_decode() {
        let report = adherence(serde_json::json!({
            "patientId": "p1",
            "medicationHistory": [
                { "medicationId": "m1", "scheduledTime": "2024-03-04T08:00:00Z", "takenTime": "2024-03-04T08:05:00Z" },
                { "medicationId": "m1", "scheduledTime": "2024-03-05T10:00:00+02:00" }
            ]
        }))
        .unwrap();
        assert_eq!(report.adherence_rate, 50.0);
        assert_eq!(report.missed_doses, 1);
    }

    #[test]
    fn mixed_timestamp_forms_rejected() {
        let err = adherence(serde_json::json!({
            "patientId": "p1",
            "medications": [
                { "medicationId": "m1", "scheduledTime": "2024-03-04T08:00:00Z" },
                { "medicationId": "m1", "scheduledTime": "2024-03-05T08:00:00" }
            ]
        }))
        .unwrap_err();
        assert!(matches!(err, InsightError::InvalidInput(_)));
    }

    #[test]
    fn explicit_now_must_match_form() {
        let err = adherence(serde_json::json!({
            "patientId": "p1",
            "medications": [
                { "medicationId": "m1", "scheduledTime": "2024-03-04T08:00:00" }
            ],
            "now": "2024-03-06T09:00:00Z"
        }))
        .unwrap_err();
        assert!(err.to_string().contains("now"));
    }

    #[test]
    fn explicit_now_pins_pending_doses() {
        let report = adherence(serde_json::json!({
            "patientId": "p1",
            "medications": [
                { "medicationId": "m1", "scheduledTime": "2024-03-04T08:00:00", "takenTime": "2024-03-04T08:00:00" },
                { "medicationId": "m1", "scheduledTime": "2024-03-05T08:00:00" }
            ],
            "now": "2024-03-04T12:00:00"
        }))
        .unwrap();
        assert_eq!(report.missed_doses, 0);
        assert_eq!(report.adherence_rate, 100.0);
    }

    #[test]
    fn severity_out_of_range_rejected() {
        let req: PatternRequest = serde_json::from_value(serde_json::json!({
            "patientId": "p1",
            "symptoms": [ { "time": "2024-03-04T08:00:00Z", "type": "nausea", "severity": 11 } ]
        }))
        .unwrap();
        let err = req.run(&InsightEngine::default(), fallback()).unwrap_err();
        assert!(err.to_string().contains("severity"));

        let req: PatternRequest = serde_json::from_value(serde_json::json!({
            "patientId": "p1",
            "symptoms": [ { "time": "2024-03-04T08:00:00Z", "type": "nausea", "severity": -1 } ]
        }))
        .unwrap();
        assert!(req.run(&InsightEngine::default(), fallback()).is_err());
    }

    #[test]
    fn unknown_status_rejected() {
        let req: AppointmentRequest = serde_json::from_value(serde_json::json!({
            "patientId": "p1",
            "appointmentHistory": [ { "time": "2024-03-04T08:00:00Z", "status": "rescheduled" } ]
        }))
        .unwrap();
        let err = req.run(&InsightEngine::default(), fallback()).unwrap_err();
        assert!(err.to_string().contains("appointments[0].status"));
    }

    #[test]
    fn bad_date_rejected() {
        let req: WeeklyRequest = serde_json::from_value(serde_json::json!({
            "patientId": "p1",
            "startDate": "2024-13-01",
            "endDate": "2024-03-07"
        }))
        .unwrap();
        assert!(matches!(
            req.run(&InsightEngine::default(), fallback()),
            Err(InsightError::InvalidInput(_))
        ));
    }
}
