//! Pre-computation checks. Every operation runs these before touching the
//! data so a bad request is rejected whole, never partially processed.

use crate::error::{InsightError, Result};
use crate::event::{DoseEvent, EventSet, SymptomReport, MAX_SEVERITY};

pub fn validate_patient_id(patient_id: &str) -> Result<()> {
    if patient_id.trim().is_empty() {
        return Err(InsightError::invalid_input("patientId must not be empty"));
    }
    Ok(())
}

pub fn validate_doses(doses: &[DoseEvent]) -> Result<()> {
    for (i, dose) in doses.iter().enumerate() {
        if dose.medication_id.trim().is_empty() {
            return Err(InsightError::invalid_input(format!(
                "medications[{i}].medicationId must not be empty"
            )));
        }
    }
    Ok(())
}

/// Symptom reports must carry a type, a 0–10 severity, and be sorted by time
/// (equal times allowed).
pub fn validate_symptoms(symptoms: &[SymptomReport]) -> Result<()> {
    for (i, report) in symptoms.iter().enumerate() {
        if report.symptom_type.trim().is_empty() {
            return Err(InsightError::invalid_input(format!(
                "symptoms[{i}].type must not be empty"
            )));
        }
        if report.severity > MAX_SEVERITY {
            return Err(InsightError::invalid_input(format!(
                "symptoms[{i}].severity {} is outside 0-{MAX_SEVERITY}",
                report.severity
            )));
        }
    }

    if let Some(i) = symptoms.windows(2).position(|pair| pair[1].time < pair[0].time) {
        return Err(InsightError::invalid_input(format!(
            "symptoms[{}] is earlier than symptoms[{}]; reports must be chronological",
            i + 1,
            i
        )));
    }
    Ok(())
}

pub fn validate_events(events: &EventSet) -> Result<()> {
    validate_doses(&events.doses)?;
    validate_symptoms(&events.symptoms)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn report(hour: u32, severity: u8) -> SymptomReport {
        SymptomReport {
            time: Utc.with_ymd_and_hms(2024, 3, 4, hour, 0, 0).unwrap(),
            symptom_type: "fatigue".into(),
            severity,
            note: None,
        }
    }

    #[test]
    fn blank_patient_rejected() {
        assert!(validate_patient_id("  ").is_err());
        assert!(validate_patient_id("p-1").is_ok());
    }

    #[test]
    fn severity_range_enforced() {
        assert!(validate_symptoms(&[report(8, 10), report(9, 0)]).is_ok());
        let err = validate_symptoms(&[report(8, 11)]).unwrap_err();
        assert_eq!(err.kind(), "invalid_input");
    }

    #[test]
    fn out_of_order_reports_rejected() {
        assert!(validate_symptoms(&[report(9, 2), report(8, 2)]).is_err());
        assert!(validate_symptoms(&[report(8, 2), report(8, 5)]).is_ok());
    }

    #[test]
    fn blank_medication_rejected() {
        let dose = DoseEvent {
            medication_id: String::new(),
            scheduled_time: Utc.with_ymd_and_hms(2024, 3, 4, 8, 0, 0).unwrap(),
            taken_time: None,
        };
        let events = EventSet {
            doses: vec![dose],
            ..EventSet::default()
        };
        assert!(validate_events(&events).is_err());
    }
}
