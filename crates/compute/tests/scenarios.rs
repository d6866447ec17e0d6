//! End-to-end scenarios through `InsightEngine`.

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};

use serde::Serialize;

use carepulse_compute::request::{
    AdherenceRequest, AppointmentRequest, DailyRequest, PatternRequest, WeeklyRequest,
};
use carepulse_compute::{Consistency, InsightEngine};
use carepulse_core::{
    AppointmentEvent, AppointmentStatus, DoseEvent, EventSet, InsightError, PatternKind,
    SymptomReport, TrendDirection,
};

fn at(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, day, hour, minute, 0).unwrap()
}

fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
}

fn dose(day: u32, hour: u32, taken: Option<DateTime<Utc>>) -> DoseEvent {
    DoseEvent {
        medication_id: "lisinopril".into(),
        scheduled_time: at(day, hour, 0),
        taken_time: taken,
    }
}

fn symptom(day: u32, hour: u32, severity: u8) -> SymptomReport {
    SymptomReport {
        time: at(day, hour, 0),
        symptom_type: "headache".into(),
        severity,
        note: None,
    }
}

#[test]
fn monday_taken_tuesday_missed() {
    // 2024-03-04 is a Monday.
    let doses = vec![dose(4, 8, Some(at(4, 8, 5))), dose(5, 8, None)];
    let report = InsightEngine::default()
        .adherence_analysis("patient-1", &doses, at(6, 9, 0))
        .unwrap();
    assert_eq!(report.missed_doses, 1);
    assert_eq!(report.late_doses, 0);
    assert_eq!(report.adherence_rate, 50.0);
    assert_eq!(report.trends.consistency, Consistency::Poor);
    assert_eq!(
        report.recommendations,
        vec!["Set additional reminders for missed doses"]
    );
}

#[test]
fn evening_reports_form_pattern() {
    let symptoms: Vec<_> = (4..=8)
        .zip([18, 19, 20, 21, 22])
        .map(|(d, h)| symptom(d, h, 4))
        .collect();
    let report = InsightEngine::default()
        .detect_symptom_patterns("patient-1", &symptoms, &[], at(9, 0, 0))
        .unwrap();
    let tod = report
        .patterns
        .iter()
        .find(|p| p.kind == PatternKind::TimeOfDay)
        .unwrap();
    assert!(tod.confidence >= 0.5);
    assert!(report
        .recommendations
        .contains(&"Consider adjusting medication timing relative to symptom pattern".to_string()));
}

#[test]
fn inverted_window_rejected() {
    let err = InsightEngine::default()
        .weekly_summary("patient-1", date(10), date(4), &EventSet::default(), at(11, 0, 0))
        .unwrap_err();
    assert!(matches!(err, InsightError::InvalidWindow { .. }));
    assert_eq!(err.kind(), "invalid_window");
}

#[test]
fn zero_doses_is_full_adherence() {
    let report = InsightEngine::default()
        .adherence_analysis("patient-1", &[], at(6, 9, 0))
        .unwrap();
    assert_eq!(report.adherence_rate, 100.0);
    assert_eq!(report.missed_doses, 0);
    assert_eq!(report.late_doses, 0);
    assert_eq!(report.insights, vec!["No scheduled doses to analyze yet"]);
}

#[test]
fn constant_severity_is_stable() {
    let events = EventSet {
        symptoms: (4..=10).map(|d| symptom(d, 9, 5)).collect(),
        ..EventSet::default()
    };
    let summary = InsightEngine::default()
        .weekly_summary("patient-1", date(4), date(10), &events, at(11, 0, 0))
        .unwrap();
    assert_eq!(summary.symptom_trends.trend, TrendDirection::Stable);
    assert_eq!(summary.symptom_trends.average_severity, 5.0);
}

#[test]
fn sparse_symptoms_yield_no_patterns() {
    let symptoms = vec![symptom(4, 19, 6), symptom(5, 19, 6)];
    let report = InsightEngine::default()
        .detect_symptom_patterns("patient-1", &symptoms, &[], at(9, 0, 0))
        .unwrap();
    assert!(report.patterns.is_empty());
}

#[test]
fn out_of_order_symptoms_rejected() {
    let symptoms = vec![symptom(5, 9, 3), symptom(4, 9, 3)];
    let err = InsightEngine::default()
        .detect_symptom_patterns("patient-1", &symptoms, &[], at(9, 0, 0))
        .unwrap_err();
    assert!(matches!(err, InsightError::InvalidInput(_)));
}

#[test]
fn weekly_counts_missed_doses_and_appointments() {
    let events = EventSet {
        doses: vec![
            dose(4, 8, Some(at(4, 8, 0))),
            dose(5, 8, Some(at(5, 9, 30))),
            dose(6, 8, None),
            dose(12, 8, None),
        ],
        // Spread over the day so no time-of-day pattern forms.
        symptoms: vec![symptom(4, 9, 2), symptom(6, 14, 4), symptom(8, 20, 6)],
        appointments: vec![
            AppointmentEvent {
                time: at(7, 10, 0),
                status: AppointmentStatus::Missed,
                notes: None,
                doctor: None,
                reason: None,
            },
            AppointmentEvent {
                time: at(2, 10, 0),
                status: AppointmentStatus::Missed,
                notes: None,
                doctor: None,
                reason: None,
            },
        ],
    };
    let summary = InsightEngine::default()
        .weekly_summary("patient-1", date(4), date(10), &events, at(11, 0, 0))
        .unwrap();

    assert_eq!(summary.missed_events, 2);
    assert!((summary.medication_adherence - 200.0 / 3.0).abs() < 1e-9);
    assert_eq!(summary.symptom_trends.trend, TrendDirection::Worsening);
    assert!(summary
        .insights
        .contains(&"1 dose taken more than 30 minutes late".to_string()));
    assert!(summary.insights.contains(&"1 missed appointment".to_string()));
    assert_eq!(
        summary.recommendations,
        vec![
            "Set additional reminders for missed doses",
            "Schedule follow-up with doctor regarding worsening symptoms",
        ]
    );
}

#[test]
fn moving_a_dose_late_never_improves_adherence() {
    let engine = InsightEngine::default();
    let now = at(20, 0, 0);
    let base: Vec<DoseEvent> = (4..=10).map(|d| dose(d, 8, Some(at(d, 8, 0)))).collect();
    let before = engine.adherence_analysis("p", &base, now).unwrap();

    for i in 0..base.len() {
        let mut shifted = base.clone();
        shifted[i].taken_time = Some(shifted[i].scheduled_time + Duration::hours(3));
        let after = engine.adherence_analysis("p", &shifted, now).unwrap();
        assert!(after.adherence_rate <= before.adherence_rate);
        assert!(
            after.missed_doses + after.late_doses >= before.missed_doses + before.late_doses
        );
    }
}

/// Runs an operation twice with different fallback clocks; a pinned `now`
/// must make both outputs byte-identical.
fn assert_idempotent<R: Serialize>(run: impl Fn(DateTime<Utc>) -> R) {
    let first = serde_json::to_string(&run(Utc::now())).unwrap();
    let second = serde_json::to_string(&run(at(28, 23, 59))).unwrap();
    assert_eq!(first, second);
}

#[test]
fn pinned_now_is_idempotent() {
    let engine = InsightEngine::default();
    let medications = serde_json::json!([
        { "medicationId": "m1", "scheduledTime": "2024-03-04T08:00:00Z", "takenTime": "2024-03-04T08:10:00Z" },
        { "medicationId": "m2", "scheduledTime": "2024-03-04T20:00:00Z" },
        { "medicationId": "m2", "scheduledTime": "2024-03-06T20:00:00Z" }
    ]);
    let symptoms = serde_json::json!([
        { "time": "2024-03-04T21:00:00Z", "type": "nausea", "severity": 7 },
        { "time": "2024-03-05T20:30:00Z", "type": "nausea", "severity": 5 },
        { "time": "2024-03-06T21:15:00Z", "type": "nausea", "severity": 6 }
    ]);
    let appointments = serde_json::json!([
        { "time": "2024-03-01T10:00:00Z", "status": "missed" },
        { "time": "2024-03-06T10:00:00Z", "status": "upcoming", "doctor": "Dr. Okafor" }
    ]);
    let now = "2024-03-05T00:00:00Z";

    let daily: DailyRequest = serde_json::from_value(serde_json::json!({
        "patientId": "patient-1",
        "date": "2024-03-04",
        "medications": medications,
        "symptoms": symptoms,
        "now": now
    }))
    .unwrap();
    assert_idempotent(|fallback| daily.run(&engine, fallback).unwrap());

    let weekly: WeeklyRequest = serde_json::from_value(serde_json::json!({
        "patientId": "patient-1",
        "startDate": "2024-03-04",
        "endDate": "2024-03-10",
        "medications": medications,
        "symptoms": symptoms,
        "appointments": appointments,
        "now": now
    }))
    .unwrap();
    assert_idempotent(|fallback| weekly.run(&engine, fallback).unwrap());

    let patterns: PatternRequest = serde_json::from_value(serde_json::json!({
        "patientId": "patient-1",
        "symptoms": symptoms,
        "medications": medications,
        "now": now
    }))
    .unwrap();
    assert_idempotent(|fallback| patterns.run(&engine, fallback).unwrap());

    let appointment: AppointmentRequest = serde_json::from_value(serde_json::json!({
        "patientId": "patient-1",
        "appointmentHistory": appointments,
        "symptoms": symptoms,
        "medications": medications,
        "now": now
    }))
    .unwrap();
    assert_idempotent(|fallback| appointment.run(&engine, fallback).unwrap());

    let adherence: AdherenceRequest = serde_json::from_value(serde_json::json!({
        "patientId": "patient-1",
        "medicationHistory": medications,
        "now": now
    }))
    .unwrap();
    assert_idempotent(|fallback| adherence.run(&engine, fallback).unwrap());
}

#[test]
fn weekly_request_wire_shape() {
    let req: WeeklyRequest = serde_json::from_value(serde_json::json!({
        "patientId": "patient-1",
        "startDate": "2024-03-04",
        "endDate": "2024-03-10",
        "medications": [
            { "medicationId": "m1", "scheduledTime": "2024-03-04T08:00:00", "takenTime": "2024-03-04T08:00:00" }
        ],
        "now": "2024-03-11T00:00:00"
    }))
    .unwrap();
    let report = req.run(&InsightEngine::default(), Utc::now()).unwrap();
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["patientId"], "patient-1");
    assert_eq!(json["startDate"], "2024-03-04");
    assert_eq!(json["medicationAdherence"], 100.0);
    assert_eq!(json["symptomTrends"]["trend"], "stable");
    assert_eq!(json["missedEvents"], 0);
}

#[test]
fn appointment_prep_end_to_end() {
    let events = EventSet {
        doses: vec![dose(4, 8, None), dose(5, 8, Some(at(5, 8, 0)))],
        symptoms: (1..=4).map(|d| symptom(d, 20, 5)).collect(),
        appointments: vec![
            AppointmentEvent {
                time: at(1, 10, 0),
                status: AppointmentStatus::Completed,
                notes: Some("Track evening headaches".into()),
                doctor: Some("Dr. Nakamura".into()),
                reason: None,
            },
            AppointmentEvent {
                time: at(7, 15, 0),
                status: AppointmentStatus::Upcoming,
                notes: None,
                doctor: Some("Dr. Nakamura".into()),
                reason: Some("follow-up".into()),
            },
        ],
    };
    let report = InsightEngine::default()
        .appointment_suggestions("patient-1", &events, at(6, 9, 0))
        .unwrap();
    assert_eq!(
        report.suggestions,
        vec![
            "Prepare for your appointment on 2024-03-07 15:00 with Dr. Nakamura (follow-up)",
            "Follow up on notes from your last visit: Track evening headaches",
            "Bring up the evening symptom pattern",
            "Ask about options to make your medication schedule easier",
        ]
    );
    assert_eq!(
        report.checklist,
        vec![
            "Bring list of current medications",
            "Bring insurance card and ID",
            "Prepare questions about new symptoms",
            "Bring your medication log",
        ]
    );
}
