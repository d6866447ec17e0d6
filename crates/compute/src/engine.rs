use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use tracing::debug;

use carepulse_core::validate::{
    validate_doses, validate_events, validate_patient_id, validate_symptoms,
};
use carepulse_core::{
    select_window, AppointmentStatus, Calendar, DoseEvent, EventSet, Pattern, Result,
    SymptomReport, Window,
};
use carepulse_rules::{generate_recommendations, CompiledInsightConfig, InsightSignals};

use crate::adherence::{AdherenceScore, AdherenceScorer, DoseOutcome};
use crate::appointment::{next_upcoming, plural, AppointmentAdvisor, PrepContext};
use crate::pattern::{PatternDetector, PatternInput};
use crate::report::{
    AdherenceReport, AppointmentSuggestionReport, DailySummary, SymptomPatternReport,
    SymptomTrendSummary, WeeklySummary,
};
use crate::trend::{SymptomTrend, TrendDetector};

/// Stateless insight engine: immutable configuration plus the components
/// built from it. Every operation validates its input first and then
/// computes the report from the supplied events and `now` alone.
pub struct InsightEngine {
    config: CompiledInsightConfig,
    calendar: Calendar,
    scorer: AdherenceScorer,
    trends: TrendDetector,
    patterns: PatternDetector,
    advisor: AppointmentAdvisor,
}

impl Default for InsightEngine {
    fn default() -> Self {
        let config = CompiledInsightConfig::default();
        Self {
            scorer: AdherenceScorer::from_params(&config.adherence),
            trends: TrendDetector::from_params(&config.trend),
            patterns: PatternDetector::from_params(&config.patterns),
            advisor: AppointmentAdvisor::from_params(&config.summary),
            calendar: Calendar::utc(),
            config,
        }
    }
}

impl InsightEngine {
    pub fn new(config: CompiledInsightConfig) -> Result<Self> {
        let calendar = Calendar::with_offset_minutes(config.calendar.utc_offset_minutes)?;
        Ok(Self {
            scorer: AdherenceScorer::from_params(&config.adherence),
            trends: TrendDetector::from_params(&config.trend),
            patterns: PatternDetector::from_params(&config.patterns),
            advisor: AppointmentAdvisor::from_params(&config.summary),
            calendar,
            config,
        })
    }

    pub fn config(&self) -> &CompiledInsightConfig {
        &self.config
    }

    pub fn calendar(&self) -> &Calendar {
        &self.calendar
    }

    // ── Operations ──────────────────────────────────────────────────

    /// Summary of a single calendar date.
    pub fn daily_summary(
        &self,
        patient_id: &str,
        date: NaiveDate,
        events: &EventSet,
        now: DateTime<Utc>,
    ) -> Result<DailySummary> {
        validate_patient_id(patient_id)?;
        validate_events(events)?;

        let cal = &self.calendar;
        let window = Window::single_day(date);
        let doses = select_window(&events.doses, &window, cal)?;
        let symptoms = select_window(&events.symptoms, &window, cal)?;
        let appointments = select_window(&events.appointments, &window, cal)?;

        let score = self.scorer.score(&doses, &window, cal, &now);
        let trend = self.trends.detect(&symptoms);
        let patterns = self.detect_patterns(&symptoms, &doses, &window, &now);

        let mut insights = vec![self.dose_tally(&doses, &score)];
        insights.push(symptom_tally(&symptoms));
        if let Some(next) = next_upcoming(&events.appointments, &now) {
            insights.push(format!("Next appointment: {}", cal.format_minute(&next.time)));
        }

        let mut concerns = Vec::new();
        for dose in &doses {
            if self.scorer.classify(dose, &now) == DoseOutcome::Missed {
                concerns.push(format!(
                    "Missed dose of {} scheduled at {}",
                    dose.medication_id,
                    cal.format_clock(&dose.scheduled_time)
                ));
            }
        }
        let high = self.config.summary.high_severity_threshold;
        for report in symptoms.iter().filter(|r| r.severity >= high) {
            concerns.push(format!(
                "High severity {} reported ({}/10)",
                report.symptom_type, report.severity
            ));
        }
        for appt in appointments
            .iter()
            .filter(|a| a.status == AppointmentStatus::Missed)
        {
            concerns.push(format!("Missed appointment at {}", cal.format_clock(&appt.time)));
        }

        let recommendations = self.recommend(&signals(Some(&score), Some(&trend), &patterns));

        debug!(
            patient_id,
            date = %date,
            doses = doses.len(),
            symptoms = symptoms.len(),
            concerns = concerns.len(),
            "daily summary built"
        );
        Ok(DailySummary {
            date,
            patient_id: patient_id.to_string(),
            insights,
            concerns,
            recommendations,
        })
    }

    /// Summary over an inclusive date range.
    pub fn weekly_summary(
        &self,
        patient_id: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
        events: &EventSet,
        now: DateTime<Utc>,
    ) -> Result<WeeklySummary> {
        validate_patient_id(patient_id)?;
        let window = Window::new(start_date, end_date)?;
        validate_events(events)?;

        let cal = &self.calendar;
        let doses = select_window(&events.doses, &window, cal)?;
        let symptoms = select_window(&events.symptoms, &window, cal)?;
        let appointments = select_window(&events.appointments, &window, cal)?;

        let score = self.scorer.score(&doses, &window, cal, &now);
        let trend = self.trends.detect(&symptoms);
        let patterns = self.detect_patterns(&symptoms, &doses, &window, &now);
        let missed_appointments = appointments
            .iter()
            .filter(|a| a.status == AppointmentStatus::Missed)
            .count() as u32;

        let mut insights = Vec::new();
        if score.scored_doses() > 0 {
            insights.push(format!(
                "Medication adherence {:.1}% ({})",
                score.adherence_rate,
                self.scorer.consistency(score.adherence_rate)
            ));
        } else {
            insights.push("No medication doses were due this period".to_string());
        }
        if let Some(late) = self.late_insight(&score) {
            insights.push(late);
        }
        if symptoms.is_empty() {
            insights.push("No symptoms reported this period".to_string());
        } else {
            insights.push(format!(
                "Symptom severity is {} (average {:.1})",
                trend.trend, trend.average_severity
            ));
        }
        insights.extend(patterns.iter().map(|p| p.description.clone()));
        if missed_appointments > 0 {
            insights.push(format!(
                "{} missed {}",
                missed_appointments,
                plural(missed_appointments as usize, "appointment", "appointments")
            ));
        }

        let recommendations = self.recommend(&signals(Some(&score), Some(&trend), &patterns));

        debug!(patient_id, window = %window, missed_appointments, "weekly summary built");
        Ok(WeeklySummary {
            patient_id: patient_id.to_string(),
            start_date,
            end_date,
            medication_adherence: score.adherence_rate,
            symptom_trends: SymptomTrendSummary {
                average_severity: trend.average_severity,
                trend: trend.trend,
            },
            missed_events: score.missed_doses + missed_appointments,
            insights,
            recommendations,
        })
    }

    /// Patterns over the date span of the supplied reports. Doses, when
    /// given, feed the missed-dose correlation check.
    pub fn detect_symptom_patterns(
        &self,
        patient_id: &str,
        symptoms: &[SymptomReport],
        doses: &[DoseEvent],
        now: DateTime<Utc>,
    ) -> Result<SymptomPatternReport> {
        validate_patient_id(patient_id)?;
        validate_symptoms(symptoms)?;
        validate_doses(doses)?;

        let window = self.span_or_today(symptoms.iter().map(|s| s.time), &now);
        let trend = self.trends.detect(symptoms);
        let patterns = self.detect_patterns(symptoms, doses, &window, &now);
        let recommendations = self.recommend(&signals(None, Some(&trend), &patterns));

        debug!(patient_id, window = %window, patterns = patterns.len(), "symptom patterns built");
        Ok(SymptomPatternReport {
            patient_id: patient_id.to_string(),
            patterns,
            recommendations,
        })
    }

    pub fn appointment_suggestions(
        &self,
        patient_id: &str,
        events: &EventSet,
        now: DateTime<Utc>,
    ) -> Result<AppointmentSuggestionReport> {
        validate_patient_id(patient_id)?;
        validate_events(events)?;

        let mut context = PrepContext {
            has_symptoms: !events.symptoms.is_empty(),
            ..PrepContext::default()
        };
        if context.has_symptoms {
            context.trend = Some(self.trends.detect(&events.symptoms).trend);
            context.day_part = self
                .patterns
                .time_of_day(&events.symptoms, &self.calendar)
                .map(|(part, _)| part);
        }
        if !events.doses.is_empty() {
            let window = self.span_or_today(events.doses.iter().map(|d| d.scheduled_time), &now);
            let score = self.scorer.score(&events.doses, &window, &self.calendar, &now);
            if score.scored_doses() > 0 {
                context.adherence_rate = Some(score.adherence_rate);
            }
            context.any_missed_dose = score.missed_doses > 0;
        }

        let suggestions =
            self.advisor
                .suggestions(&events.appointments, &context, &self.calendar, &now);
        let checklist = self.advisor.checklist(&context);

        debug!(patient_id, suggestions = suggestions.len(), "appointment suggestions built");
        Ok(AppointmentSuggestionReport {
            patient_id: patient_id.to_string(),
            suggestions,
            checklist,
        })
    }

    /// Adherence over the date span of the medication history.
    pub fn adherence_analysis(
        &self,
        patient_id: &str,
        doses: &[DoseEvent],
        now: DateTime<Utc>,
    ) -> Result<AdherenceReport> {
        validate_patient_id(patient_id)?;
        validate_doses(doses)?;

        let cal = &self.calendar;
        let window = self.span_or_today(doses.iter().map(|d| d.scheduled_time), &now);
        let score = self.scorer.score(doses, &window, cal, &now);
        let trends = self.scorer.trend(doses, &score, &window, cal, &now);

        let mut insights = Vec::new();
        if score.scored_doses() == 0 {
            insights.push("No scheduled doses to analyze yet".to_string());
        } else {
            insights.push(format!(
                "Adherence is {}: {:.1}% of scheduled doses taken",
                trends.consistency, score.adherence_rate
            ));
        }
        if trends.improving {
            insights.push("Adherence improved in the second half of the period".to_string());
        }
        if score.weekend_bias {
            insights.push("Missed doses cluster on weekends".to_string());
        }
        if let Some(late) = self.late_insight(&score) {
            insights.push(late);
        }
        if let Some((medication, count)) = self.most_missed(doses, &now) {
            insights.push(format!(
                "Most frequently missed medication: {} ({} missed)",
                medication, count
            ));
        }

        let recommendations = self.recommend(&signals(Some(&score), None, &[]));

        debug!(patient_id, window = %window, rate = score.adherence_rate, "adherence analysis built");
        Ok(AdherenceReport {
            patient_id: patient_id.to_string(),
            adherence_rate: score.adherence_rate,
            missed_doses: score.missed_doses,
            late_doses: score.late_doses,
            trends,
            insights,
            recommendations,
        })
    }

    // ── Helpers ─────────────────────────────────────────────────────

    fn detect_patterns(
        &self,
        reports: &[SymptomReport],
        doses: &[DoseEvent],
        window: &Window,
        now: &DateTime<Utc>,
    ) -> Vec<Pattern> {
        self.patterns.detect(&PatternInput {
            reports,
            doses,
            window,
            calendar: &self.calendar,
            now,
        })
    }

    fn recommend(&self, signals: &InsightSignals) -> Vec<String> {
        let table = &self.config.recommendations;
        generate_recommendations(&table.rules, signals, table.max_count)
    }

    fn span_or_today<I>(&self, instants: I, now: &DateTime<Utc>) -> Window
    where
        I: IntoIterator<Item = DateTime<Utc>>,
    {
        Window::spanning(&self.calendar, instants)
            .unwrap_or_else(|| Window::single_day(self.calendar.date_of(now)))
    }

    fn dose_tally(&self, doses: &[DoseEvent], score: &AdherenceScore) -> String {
        let scored = score.scored_doses();
        if doses.is_empty() {
            "No medication doses scheduled".to_string()
        } else if scored == 0 {
            format!(
                "{} medication {} still to take",
                score.pending_doses,
                plural(score.pending_doses as usize, "dose", "doses")
            )
        } else if score.on_time_doses == scored {
            format!(
                "All {} medication {} taken on time",
                scored,
                plural(scored as usize, "dose", "doses")
            )
        } else {
            format!(
                "{} of {} scheduled doses taken",
                score.on_time_doses + score.late_doses,
                scored
            )
        }
    }

    fn late_insight(&self, score: &AdherenceScore) -> Option<String> {
        (score.late_doses > 0).then(|| {
            format!(
                "{} {} taken more than {} minutes late",
                score.late_doses,
                plural(score.late_doses as usize, "dose", "doses"),
                self.config.adherence.late_threshold_minutes
            )
        })
    }

    /// Medication with the most missed doses; ties go to the smallest id.
    fn most_missed<'a>(&self, doses: &'a [DoseEvent], now: &DateTime<Utc>) -> Option<(&'a str, u32)> {
        let mut counts: BTreeMap<&str, u32> = BTreeMap::new();
        for dose in doses {
            if self.scorer.classify(dose, now) == DoseOutcome::Missed {
                *counts.entry(dose.medication_id.as_str()).or_default() += 1;
            }
        }
        counts.into_iter().fold(None, |best, (id, n)| match best {
            Some((_, top)) if top >= n => best,
            _ => Some((id, n)),
        })
    }
}

fn symptom_tally(symptoms: &[SymptomReport]) -> String {
    if symptoms.is_empty() {
        return "No symptoms reported".to_string();
    }
    let average =
        symptoms.iter().map(|s| f64::from(s.severity)).sum::<f64>() / symptoms.len() as f64;
    format!(
        "{} symptom {}, average severity {:.1}",
        symptoms.len(),
        plural(symptoms.len(), "report", "reports"),
        average
    )
}

fn signals(
    score: Option<&AdherenceScore>,
    trend: Option<&SymptomTrend>,
    patterns: &[Pattern],
) -> InsightSignals {
    InsightSignals {
        adherence_rate: score.map(|s| s.adherence_rate),
        missed_doses: score.map(|s| s.missed_doses),
        weekend_bias: score.is_some_and(|s| s.weekend_bias),
        trend: trend.map(|t| t.trend),
        patterns: patterns.iter().map(|p| p.kind).collect(),
    }
}
