//! Symptom pattern detection.
//!
//! Three independent detectors run over the same reports and every pattern
//! that clears its thresholds is returned:
//! - **time of day**: one part of the day dominates the reports;
//! - **frequency**: the second half of the window has markedly more reports;
//! - **correlation**: reports cluster in the hours after missed doses.
//!
//! Confidence values are heuristics in `[0, 1]`, not probabilities.

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use carepulse_core::{Calendar, DoseEvent, Pattern, PatternKind, SymptomReport, Window};
use carepulse_rules::insight_config::PatternParams;

/// Calendar-hour buckets, in tie-break order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DayPart {
    /// 05:00–11:59
    Morning,
    /// 12:00–16:59
    Afternoon,
    /// 17:00–21:59
    Evening,
    /// 22:00–04:59
    Night,
}

impl DayPart {
    pub const ALL: [DayPart; 4] = [
        DayPart::Morning,
        DayPart::Afternoon,
        DayPart::Evening,
        DayPart::Night,
    ];

    pub fn from_hour(hour: u32) -> Self {
        match hour {
            5..=11 => DayPart::Morning,
            12..=16 => DayPart::Afternoon,
            17..=21 => DayPart::Evening,
            _ => DayPart::Night,
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl std::fmt::Display for DayPart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DayPart::Morning => write!(f, "morning"),
            DayPart::Afternoon => write!(f, "afternoon"),
            DayPart::Evening => write!(f, "evening"),
            DayPart::Night => write!(f, "night"),
        }
    }
}

/// Everything the detector looks at for one request.
pub struct PatternInput<'a> {
    /// Reports already restricted to `window`, in chronological order.
    pub reports: &'a [SymptomReport],
    /// Doses used for the correlation check; may be empty.
    pub doses: &'a [DoseEvent],
    pub window: &'a Window,
    pub calendar: &'a Calendar,
    pub now: &'a DateTime<Utc>,
}

pub struct PatternDetector {
    params: PatternParams,
}

impl Default for PatternDetector {
    fn default() -> Self {
        Self::from_params(&PatternParams::default())
    }
}

impl PatternDetector {
    pub fn from_params(params: &PatternParams) -> Self {
        Self {
            params: params.clone(),
        }
    }

    /// All detected patterns, most confident first.
    pub fn detect(&self, input: &PatternInput<'_>) -> Vec<Pattern> {
        let total = input.reports.len();
        if total < self.params.min_samples {
            debug!(reports = total, min_samples = self.params.min_samples, "too few reports for patterns");
            return Vec::new();
        }

        let mut patterns: Vec<Pattern> = [
            self.time_of_day(input.reports, input.calendar)
                .map(|(_, p)| p),
            self.frequency(input.reports, input.window, input.calendar),
            self.correlation(input.reports, input.doses, input.now),
        ]
        .into_iter()
        .flatten()
        .collect();

        patterns.sort_by(|a, b| {
            b.confidence
                .total_cmp(&a.confidence)
                .then(a.kind.cmp(&b.kind))
        });

        debug!(reports = total, patterns = patterns.len(), "symptom patterns detected");
        patterns
    }

    /// Dominant part of the day, when it clears both thresholds.
    pub fn time_of_day(
        &self,
        reports: &[SymptomReport],
        calendar: &Calendar,
    ) -> Option<(DayPart, Pattern)> {
        let total = reports.len();
        if total == 0 {
            return None;
        }

        let mut counts = [0usize; 4];
        for report in reports {
            counts[DayPart::from_hour(calendar.hour_of(&report.time)).index()] += 1;
        }

        let mut best = DayPart::Morning;
        for part in DayPart::ALL {
            if counts[part.index()] > counts[best.index()] {
                best = part;
            }
        }

        let count = counts[best.index()];
        let fraction = count as f64 / total as f64;
        if fraction <= self.params.min_fraction || count < self.params.min_samples {
            return None;
        }

        let confidence = (fraction * (count as f64 / self.params.min_samples as f64).sqrt()).min(1.0);
        Some((
            best,
            Pattern {
                kind: PatternKind::TimeOfDay,
                description: format!(
                    "Symptoms are most often reported in the {} ({} of {} reports)",
                    best, count, total
                ),
                confidence,
            },
        ))
    }

    /// Increase of report count in the later half of the window.
    pub fn frequency(
        &self,
        reports: &[SymptomReport],
        window: &Window,
        calendar: &Calendar,
    ) -> Option<Pattern> {
        if reports.len() < self.params.min_samples {
            return None;
        }

        let midpoint = window.midpoint(calendar);
        let earlier = reports.iter().filter(|r| r.time < midpoint).count();
        let recent = reports.len() - earlier;

        let (confidence, description) = if earlier == 0 {
            if recent == 0 {
                return None;
            }
            (
                1.0,
                format!(
                    "All {} symptom reports fall in the second half of the period",
                    recent
                ),
            )
        } else {
            let increase = (recent as f64 - earlier as f64) / earlier as f64;
            if increase < self.params.frequency_margin {
                return None;
            }
            (
                (increase / self.params.frequency_saturation).clamp(0.0, 1.0),
                format!(
                    "Symptom reports increased by {:.0}% in the second half of the period ({} to {})",
                    increase * 100.0,
                    earlier,
                    recent
                ),
            )
        };

        Some(Pattern {
            kind: PatternKind::Frequency,
            description,
            confidence,
        })
    }

    /// Reports falling within the correlation window after a missed dose.
    pub fn correlation(
        &self,
        reports: &[SymptomReport],
        doses: &[DoseEvent],
        now: &DateTime<Utc>,
    ) -> Option<Pattern> {
        let missed: Vec<DateTime<Utc>> = doses
            .iter()
            .filter(|d| d.is_due(now) && d.taken_time.is_none())
            .map(|d| d.scheduled_time)
            .collect();
        if missed.is_empty() || reports.is_empty() {
            return None;
        }

        let horizon =
            Duration::try_hours(self.params.correlation_window_hours).unwrap_or(Duration::MAX);
        let post_miss = reports
            .iter()
            .filter(|r| {
                missed
                    .iter()
                    .any(|scheduled| {
                        *scheduled <= r.time
                            && scheduled
                                .checked_add_signed(horizon)
                                .map_or(true, |end| r.time < end)
                    })
            })
            .count();

        let fraction = post_miss as f64 / reports.len() as f64;
        if post_miss < self.params.min_samples || fraction < self.params.min_fraction {
            return None;
        }

        let confidence =
            (fraction * (post_miss as f64 / self.params.min_samples as f64).sqrt()).min(1.0);
        Some(Pattern {
            kind: PatternKind::Correlation,
            description: format!(
                "{} of {} symptom reports came within {} hours after a missed dose",
                post_miss,
                reports.len(),
                self.params.correlation_window_hours
            ),
            confidence,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, day, hour, 0, 0).unwrap()
    }

    fn report(day: u32, hour: u32) -> SymptomReport {
        SymptomReport {
            time: at(day, hour),
            symptom_type: "dizziness".into(),
            severity: 5,
            note: None,
        }
    }

    fn window(start: u32, end: u32) -> Window {
        Window::new(
            NaiveDate::from_ymd_opt(2024, 3, start).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, end).unwrap(),
        )
        .unwrap()
    }

    fn run(reports: &[SymptomReport], doses: &[DoseEvent], w: &Window) -> Vec<Pattern> {
        let cal = Calendar::utc();
        let now = at(28, 0);
        PatternDetector::default().detect(&PatternInput {
            reports,
            doses,
            window: w,
            calendar: &cal,
            now: &now,
        })
    }

    #[test]
    fn day_part_boundaries() {
        assert_eq!(DayPart::from_hour(4), DayPart::Night);
        assert_eq!(DayPart::from_hour(5), DayPart::Morning);
        assert_eq!(DayPart::from_hour(11), DayPart::Morning);
        assert_eq!(DayPart::from_hour(12), DayPart::Afternoon);
        assert_eq!(DayPart::from_hour(17), DayPart::Evening);
        assert_eq!(DayPart::from_hour(21), DayPart::Evening);
        assert_eq!(DayPart::from_hour(22), DayPart::Night);
        assert_eq!(DayPart::from_hour(0), DayPart::Night);
    }

    #[test]
    fn evening_reports_form_time_of_day_pattern() {
        let reports: Vec<_> = (4..=8).zip([18, 19, 20, 21, 22]).map(|(d, h)| report(d, h)).collect();
        let patterns = run(&reports, &[], &window(4, 8));
        let tod = patterns
            .iter()
            .find(|p| p.kind == PatternKind::TimeOfDay)
            .expect("time of day pattern");
        assert!(tod.confidence >= 0.5);
        assert!(tod.description.contains("evening"));
    }

    #[test]
    fn sparse_data_yields_nothing() {
        let reports = vec![report(4, 19), report(5, 19)];
        assert!(run(&reports, &[], &window(4, 5)).is_empty());
    }

    #[test]
    fn split_buckets_do_not_emit() {
        let reports = vec![report(4, 8), report(5, 19), report(6, 8), report(7, 19)];
        let found = PatternDetector::default().time_of_day(&reports, &Calendar::utc());
        assert!(found.is_none());
    }

    #[test]
    fn time_of_day_respects_calendar_offset() {
        // 03:00 UTC is 08:00 at +05:00.
        let reports: Vec<_> = (4..=7).map(|d| report(d, 3)).collect();
        let plus_five = Calendar::with_offset_minutes(300).unwrap();
        let (part, _) = PatternDetector::default()
            .time_of_day(&reports, &plus_five)
            .unwrap();
        assert_eq!(part, DayPart::Morning);
        let (part, _) = PatternDetector::default()
            .time_of_day(&reports, &Calendar::utc())
            .unwrap();
        assert_eq!(part, DayPart::Night);
    }

    #[test]
    fn frequency_increase_detected() {
        // Window 4..=11, midpoint day 8 00:00. One early report, four late ones.
        let reports = vec![
            report(4, 9),
            report(8, 9),
            report(9, 14),
            report(10, 19),
            report(11, 23),
        ];
        let p = PatternDetector::default()
            .frequency(&reports, &window(4, 11), &Calendar::utc())
            .unwrap();
        // +300% saturates.
        assert_eq!(p.confidence, 1.0);

        let reports = vec![report(4, 9), report(5, 9), report(8, 9), report(9, 9), report(10, 9)];
        let p = PatternDetector::default()
            .frequency(&reports, &window(4, 11), &Calendar::utc())
            .unwrap();
        // 2 -> 3 is +50%: confidence 0.25.
        assert!((p.confidence - 0.25).abs() < 1e-9);
    }

    #[test]
    fn frequency_decrease_never_emits() {
        let reports = vec![report(4, 9), report(5, 9), report(6, 9), report(9, 9)];
        assert!(PatternDetector::default()
            .frequency(&reports, &window(4, 11), &Calendar::utc())
            .is_none());
    }

    #[test]
    fn frequency_with_empty_earlier_half_saturates() {
        let reports = vec![report(9, 9), report(10, 9), report(11, 9)];
        let p = PatternDetector::default()
            .frequency(&reports, &window(4, 11), &Calendar::utc())
            .unwrap();
        assert_eq!(p.confidence, 1.0);
    }

    #[test]
    fn missed_doses_correlate_with_reports() {
        let doses: Vec<DoseEvent> = [4, 6, 8]
            .iter()
            .map(|d| DoseEvent {
                medication_id: "metformin".into(),
                scheduled_time: at(*d, 8),
                taken_time: None,
            })
            .collect();
        let reports = vec![report(4, 14), report(6, 12), report(8, 20), report(10, 9)];
        let p = PatternDetector::default()
            .correlation(&reports, &doses, &at(28, 0))
            .unwrap();
        assert_eq!(p.kind, PatternKind::Correlation);
        // 3 of 4 after a miss: 0.75 * sqrt(3/3).
        assert!((p.confidence - 0.75).abs() < 1e-9);

        let taken: Vec<DoseEvent> = doses
            .iter()
            .map(|d| DoseEvent {
                taken_time: Some(d.scheduled_time),
                ..d.clone()
            })
            .collect();
        assert!(PatternDetector::default()
            .correlation(&reports, &taken, &at(28, 0))
            .is_none());
    }

    #[test]
    fn results_sorted_by_confidence_then_kind() {
        // Evening cluster that is also back-loaded.
        let reports = vec![
            report(4, 19),
            report(9, 19),
            report(10, 19),
            report(11, 19),
            report(11, 20),
        ];
        let patterns = run(&reports, &[], &window(4, 11));
        assert_eq!(patterns.len(), 2);
        assert!(patterns[0].confidence >= patterns[1].confidence);
        // Both saturate at 1.0, so kind order decides.
        assert_eq!(patterns[0].kind, PatternKind::TimeOfDay);
        assert_eq!(patterns[1].kind, PatternKind::Frequency);
    }
}
