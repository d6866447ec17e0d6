//! Declarative recommendation rules.
//!
//! A rule pairs a [`Condition`] with a message. Rules are evaluated in table
//! order against the [`InsightSignals`] of one report; every matching rule
//! contributes its message once (exact-string dedup) until the cap is hit, so
//! earlier rules win when output is truncated.
//!
//! Conditions are leaf checks over the computed signals plus `all` / `any` /
//! `not` combinators. A leaf over a signal the report did not compute (for
//! example adherence in a symptom-only report) is false.

use serde::{Deserialize, Serialize};
use tracing::debug;

use carepulse_core::{PatternKind, TrendDirection};

use crate::schema::default_true;

// ── YAML-level types ────────────────────────────────────────────────

/// One row of the recommendation table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RecommendationRule {
    pub id: String,
    pub when: Condition,
    pub message: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// Predicate over [`InsightSignals`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "check", rename_all = "snake_case")]
pub enum Condition {
    /// Adherence rate strictly below `threshold` percent.
    AdherenceBelow { threshold: f64 },
    WeekendBias,
    Trend { is: TrendDirection },
    PatternPresent { kind: PatternKind },
    /// Adherence was scored and no dose was missed.
    NoMissedDoses,
    All { conditions: Vec<Condition> },
    Any { conditions: Vec<Condition> },
    Not { condition: Box<Condition> },
}

/// Everything a rule can look at, as computed for one report.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InsightSignals {
    pub adherence_rate: Option<f64>,
    pub missed_doses: Option<u32>,
    pub weekend_bias: bool,
    pub trend: Option<TrendDirection>,
    pub patterns: Vec<PatternKind>,
}

impl Condition {
    pub fn evaluate(&self, signals: &InsightSignals) -> bool {
        match self {
            Condition::AdherenceBelow { threshold } => signals
                .adherence_rate
                .map(|rate| rate < *threshold)
                .unwrap_or(false),
            Condition::WeekendBias => signals.weekend_bias,
            Condition::Trend { is } => signals.trend == Some(*is),
            Condition::PatternPresent { kind } => signals.patterns.contains(kind),
            Condition::NoMissedDoses => signals.missed_doses == Some(0),
            Condition::All { conditions } => conditions.iter().all(|c| c.evaluate(signals)),
            Condition::Any { conditions } => conditions.iter().any(|c| c.evaluate(signals)),
            Condition::Not { condition } => !condition.evaluate(signals),
        }
    }
}

/// Run the table in order and collect at most `max_count` distinct messages.
pub fn generate_recommendations(
    rules: &[RecommendationRule],
    signals: &InsightSignals,
    max_count: usize,
) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();

    for rule in rules.iter().filter(|r| r.enabled) {
        if out.len() >= max_count {
            break;
        }
        if !rule.when.evaluate(signals) {
            continue;
        }
        if out.iter().any(|m| m == &rule.message) {
            continue;
        }
        debug!(rule_id = %rule.id, "recommendation rule matched");
        out.push(rule.message.clone());
    }

    out
}

fn rule(id: &str, when: Condition, message: &str) -> RecommendationRule {
    RecommendationRule {
        id: id.to_string(),
        when,
        message: message.to_string(),
        enabled: true,
    }
}

/// Built-in table; `data/rules/insight-config.yml` ships the same rows.
pub fn default_rules() -> Vec<RecommendationRule> {
    vec![
        rule(
            "low-adherence",
            Condition::AdherenceBelow { threshold: 90.0 },
            "Set additional reminders for missed doses",
        ),
        rule(
            "weekend-bias",
            Condition::WeekendBias,
            "Consider weekend-specific reminders",
        ),
        rule(
            "worsening-symptoms",
            Condition::Trend {
                is: TrendDirection::Worsening,
            },
            "Schedule follow-up with doctor regarding worsening symptoms",
        ),
        rule(
            "time-of-day-pattern",
            Condition::PatternPresent {
                kind: PatternKind::TimeOfDay,
            },
            "Consider adjusting medication timing relative to symptom pattern",
        ),
        rule(
            "steady-state",
            Condition::All {
                conditions: vec![
                    Condition::NoMissedDoses,
                    Condition::Trend {
                        is: TrendDirection::Stable,
                    },
                ],
            },
            "Continue current care plan",
        ),
    ]
}
