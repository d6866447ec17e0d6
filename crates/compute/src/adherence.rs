//! Medication adherence scoring.
//!
//! Each due dose is classified as missed, late or on time against a reference
//! instant `now`; doses scheduled after `now` are pending and not scored.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use carepulse_core::{Calendar, DoseEvent, Window};
use carepulse_rules::insight_config::{AdherenceParams, ConsistencyGrades};

/// Classification of a single dose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoseOutcome {
    OnTime,
    Late,
    Missed,
    /// Scheduled after `now`.
    Pending,
}

impl DoseOutcome {
    pub fn is_taken(&self) -> bool {
        matches!(self, DoseOutcome::OnTime | DoseOutcome::Late)
    }

    pub fn is_scored(&self) -> bool {
        !matches!(self, DoseOutcome::Pending)
    }
}

/// Counts and rate over one set of doses.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdherenceScore {
    /// Percentage of scored doses that were taken, 0–100.
    pub adherence_rate: f64,
    pub missed_doses: u32,
    pub late_doses: u32,
    pub on_time_doses: u32,
    #[serde(skip)]
    pub pending_doses: u32,
    pub weekend_bias: bool,
}

impl AdherenceScore {
    pub fn scored_doses(&self) -> u32 {
        self.missed_doses + self.late_doses + self.on_time_doses
    }
}

/// Grade of the overall adherence rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Consistency {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl std::fmt::Display for Consistency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Consistency::Excellent => write!(f, "excellent"),
            Consistency::Good => write!(f, "good"),
            Consistency::Fair => write!(f, "fair"),
            Consistency::Poor => write!(f, "poor"),
        }
    }
}

/// Adherence direction across the two halves of the window plus the grade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AdherenceTrend {
    pub improving: bool,
    pub consistency: Consistency,
}

pub struct AdherenceScorer {
    late_threshold: Duration,
    weekend_bias_margin: f64,
    grades: ConsistencyGrades,
}

impl Default for AdherenceScorer {
    fn default() -> Self {
        Self::from_params(&AdherenceParams::default())
    }
}

impl AdherenceScorer {
    pub fn from_params(params: &AdherenceParams) -> Self {
        Self {
            late_threshold: Duration::try_minutes(params.late_threshold_minutes)
                .unwrap_or(Duration::MAX),
            weekend_bias_margin: params.weekend_bias_margin,
            grades: params.consistency.clone(),
        }
    }

    pub fn classify(&self, dose: &DoseEvent, now: &DateTime<Utc>) -> DoseOutcome {
        if !dose.is_due(now) {
            return DoseOutcome::Pending;
        }
        match dose.lateness() {
            None => DoseOutcome::Missed,
            Some(lateness) if lateness > self.late_threshold => DoseOutcome::Late,
            Some(_) => DoseOutcome::OnTime,
        }
    }

    /// Score doses already restricted to `window`.
    pub fn score(
        &self,
        doses: &[DoseEvent],
        window: &Window,
        calendar: &Calendar,
        now: &DateTime<Utc>,
    ) -> AdherenceScore {
        let mut score = AdherenceScore {
            adherence_rate: 100.0,
            missed_doses: 0,
            late_doses: 0,
            on_time_doses: 0,
            pending_doses: 0,
            weekend_bias: false,
        };
        let mut weekend_missed = 0u32;

        for dose in doses {
            match self.classify(dose, now) {
                DoseOutcome::OnTime => score.on_time_doses += 1,
                DoseOutcome::Late => score.late_doses += 1,
                DoseOutcome::Pending => score.pending_doses += 1,
                DoseOutcome::Missed => {
                    score.missed_doses += 1;
                    if calendar.is_weekend(&dose.scheduled_time) {
                        weekend_missed += 1;
                    }
                }
            }
        }

        let scored = score.scored_doses();
        if scored > 0 {
            let taken = score.on_time_doses + score.late_doses;
            score.adherence_rate = 100.0 * f64::from(taken) / f64::from(scored);
        }

        if score.missed_doses > 0 {
            let weekend_share = f64::from(weekend_missed) / f64::from(score.missed_doses);
            let expected = window.weekend_days() as f64 / window.num_days() as f64;
            score.weekend_bias = weekend_share > expected * self.weekend_bias_margin;
        }

        debug!(
            window = %window,
            scored,
            missed = score.missed_doses,
            late = score.late_doses,
            pending = score.pending_doses,
            rate = score.adherence_rate,
            weekend_bias = score.weekend_bias,
            "adherence scored"
        );
        score
    }

    pub fn consistency(&self, rate: f64) -> Consistency {
        if rate >= self.grades.excellent {
            Consistency::Excellent
        } else if rate >= self.grades.good {
            Consistency::Good
        } else if rate >= self.grades.fair {
            Consistency::Fair
        } else {
            Consistency::Poor
        }
    }

    /// Compare the taken share of scored doses before and after the window
    /// midpoint. Improving only when both halves have scored doses.
    pub fn trend(
        &self,
        doses: &[DoseEvent],
        score: &AdherenceScore,
        window: &Window,
        calendar: &Calendar,
        now: &DateTime<Utc>,
    ) -> AdherenceTrend {
        let midpoint = window.midpoint(calendar);
        let mut earlier = HalfTally::default();
        let mut later = HalfTally::default();

        for dose in doses {
            let outcome = self.classify(dose, now);
            if !outcome.is_scored() {
                continue;
            }
            let half = if dose.scheduled_time < midpoint {
                &mut earlier
            } else {
                &mut later
            };
            half.scored += 1;
            if outcome.is_taken() {
                half.taken += 1;
            }
        }

        let improving = match (earlier.rate(), later.rate()) {
            (Some(before), Some(after)) => after > before,
            _ => false,
        };

        AdherenceTrend {
            improving,
            consistency: self.consistency(score.adherence_rate),
        }
    }
}

#[derive(Default)]
struct HalfTally {
    scored: u32,
    taken: u32,
}

impl HalfTally {
    fn rate(&self) -> Option<f64> {
        (self.scored > 0).then(|| f64::from(self.taken) / f64::from(self.scored))
    }
}
