//! Appointment preparation: suggestions and a bring-along checklist.

use chrono::{DateTime, Duration, Utc};

use carepulse_core::{AppointmentEvent, AppointmentStatus, Calendar, TrendDirection};
use carepulse_rules::insight_config::SummaryParams;

use crate::pattern::DayPart;

/// Signals from the patient's other records that shape the suggestions.
#[derive(Debug, Clone, Default)]
pub struct PrepContext {
    pub trend: Option<TrendDirection>,
    pub day_part: Option<DayPart>,
    pub adherence_rate: Option<f64>,
    pub has_symptoms: bool,
    pub any_missed_dose: bool,
}

pub struct AppointmentAdvisor {
    upcoming_horizon: Duration,
    low_adherence_threshold: f64,
}

impl Default for AppointmentAdvisor {
    fn default() -> Self {
        Self::from_params(&SummaryParams::default())
    }
}

impl AppointmentAdvisor {
    pub fn from_params(params: &SummaryParams) -> Self {
        Self {
            upcoming_horizon: Duration::try_days(params.upcoming_horizon_days)
                .unwrap_or(Duration::MAX),
            low_adherence_threshold: params.low_adherence_threshold,
        }
    }

    /// Ordered, deduplicated suggestions.
    pub fn suggestions(
        &self,
        appointments: &[AppointmentEvent],
        context: &PrepContext,
        calendar: &Calendar,
        now: &DateTime<Utc>,
    ) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();

        // An unrepresentable horizon end covers every upcoming appointment.
        let horizon_end = now.checked_add_signed(self.upcoming_horizon);
        if let Some(next) = next_upcoming(appointments, now)
            .filter(|a| horizon_end.map_or(true, |end| a.time <= end))
        {
            let mut text = format!(
                "Prepare for your appointment on {}",
                calendar.format_minute(&next.time)
            );
            if let Some(doctor) = non_blank(&next.doctor) {
                text.push_str(&format!(" with {}", doctor));
            }
            if let Some(reason) = non_blank(&next.reason) {
                text.push_str(&format!(" ({})", reason));
            }
            out.push(text);
        }

        let last_notes = appointments
            .iter()
            .filter(|a| a.status == AppointmentStatus::Completed)
            .max_by_key(|a| a.time)
            .and_then(|a| non_blank(&a.notes));
        if let Some(notes) = last_notes {
            out.push(format!("Follow up on notes from your last visit: {}", notes));
        }

        let missed = count_status(appointments, AppointmentStatus::Missed);
        if missed > 0 {
            out.push(format!(
                "Reschedule the {} missed {}",
                missed,
                plural(missed, "appointment", "appointments")
            ));
        }
        if count_status(appointments, AppointmentStatus::Cancelled) > 0 {
            out.push("Confirm whether the cancelled appointment needs rebooking".to_string());
        }

        if context.trend == Some(TrendDirection::Worsening) {
            out.push("Mention that your symptoms have been worsening".to_string());
        }
        if let Some(part) = context.day_part {
            out.push(format!("Bring up the {} symptom pattern", part));
        }
        if context
            .adherence_rate
            .is_some_and(|rate| rate < self.low_adherence_threshold)
        {
            out.push("Ask about options to make your medication schedule easier".to_string());
        }

        let mut seen = std::collections::HashSet::new();
        out.retain(|s| seen.insert(s.clone()));
        out
    }

    pub fn checklist(&self, context: &PrepContext) -> Vec<String> {
        let mut items = vec![
            "Bring list of current medications".to_string(),
            "Bring insurance card and ID".to_string(),
        ];
        if context.has_symptoms {
            items.push("Prepare questions about new symptoms".to_string());
        }
        if context.any_missed_dose {
            items.push("Bring your medication log".to_string());
        }
        items
    }
}

/// Earliest upcoming appointment strictly after `now`.
pub fn next_upcoming<'a>(
    appointments: &'a [AppointmentEvent],
    now: &DateTime<Utc>,
) -> Option<&'a AppointmentEvent> {
    appointments
        .iter()
        .filter(|a| a.status == AppointmentStatus::Upcoming && a.time > *now)
        .min_by_key(|a| a.time)
}

pub(crate) fn plural<'a>(n: usize, one: &'a str, many: &'a str) -> &'a str {
    if n == 1 {
        one
    } else {
        many
    }
}

fn count_status(appointments: &[AppointmentEvent], status: AppointmentStatus) -> usize {
    appointments.iter().filter(|a| a.status == status).count()
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, day, hour, 0, 0).unwrap()
    }

    fn appt(day: u32, status: AppointmentStatus) -> AppointmentEvent {
        AppointmentEvent {
            time: at(day, 10),
            status,
            notes: None,
            doctor: None,
            reason: None,
        }
    }

    #[test]
    fn upcoming_within_horizon_gets_prep_line() {
        let mut next = appt(8, AppointmentStatus::Upcoming);
        next.doctor = Some("Dr. Okafor".into());
        next.reason = Some("blood pressure review".into());
        let appointments = vec![appt(20, AppointmentStatus::Upcoming), next];
        let out = AppointmentAdvisor::default().suggestions(
            &appointments,
            &PrepContext::default(),
            &Calendar::utc(),
            &at(6, 9),
        );
        assert_eq!(
            out,
            vec!["Prepare for your appointment on 2024-03-08 10:00 with Dr. Okafor (blood pressure review)"]
        );
    }

    #[test]
    fn distant_appointment_gets_no_prep_line() {
        let appointments = vec![appt(20, AppointmentStatus::Upcoming)];
        let out = AppointmentAdvisor::default().suggestions(
            &appointments,
            &PrepContext::default(),
            &Calendar::utc(),
            &at(6, 9),
        );
        assert!(out.is_empty());
    }

    #[test]
    fn history_and_context_drive_suggestions() {
        let mut first = appt(1, AppointmentStatus::Completed);
        first.notes = Some("old notes".into());
        let mut last = appt(4, AppointmentStatus::Completed);
        last.notes = Some("Recheck potassium levels".into());
        let appointments = vec![
            first,
            last,
            appt(2, AppointmentStatus::Missed),
            appt(3, AppointmentStatus::Missed),
            appt(5, AppointmentStatus::Cancelled),
        ];
        let context = PrepContext {
            trend: Some(TrendDirection::Worsening),
            day_part: Some(DayPart::Evening),
            adherence_rate: Some(80.0),
            has_symptoms: true,
            any_missed_dose: true,
        };
        let out = AppointmentAdvisor::default().suggestions(
            &appointments,
            &context,
            &Calendar::utc(),
            &at(6, 9),
        );
        assert_eq!(
            out,
            vec![
                "Follow up on notes from your last visit: Recheck potassium levels",
                "Reschedule the 2 missed appointments",
                "Confirm whether the cancelled appointment needs rebooking",
                "Mention that your symptoms have been worsening",
                "Bring up the evening symptom pattern",
                "Ask about options to make your medication schedule easier",
            ]
        );
    }

    #[test]
    fn checklist_grows_with_context() {
        let advisor = AppointmentAdvisor::default();
        assert_eq!(advisor.checklist(&PrepContext::default()).len(), 2);
        let context = PrepContext {
            has_symptoms: true,
            any_missed_dose: true,
            ..PrepContext::default()
        };
        let items = advisor.checklist(&context);
        assert_eq!(items.len(), 4);
        assert_eq!(items[3], "Bring your medication log");
    }
}
