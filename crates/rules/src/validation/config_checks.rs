//! Checks for the InsightConfig envelope, thresholds and rule table.

use std::collections::HashSet;

use super::fuzzy::{closest_match, is_kebab_case};
use super::ValidationResult;

use crate::insight_config::{InsightConfigRule, INSIGHT_CONFIG_KIND};
use crate::recommendation::Condition;
use crate::schema::API_VERSION;

/// Offsets must stay strictly inside ±24h.
const MAX_OFFSET_MINUTES: i32 = 24 * 60;
// Upper bounds for the configured spans.
const MAX_LATE_THRESHOLD_MINUTES: i64 = 24 * 60;
const MAX_HORIZON_DAYS: i64 = 10 * 365;
const MAX_CORRELATION_WINDOW_HOURS: i64 = 365 * 24;

// ── Envelope ────────────────────────────────────────────────────────

pub fn validate_envelope(rule: &InsightConfigRule, result: &mut ValidationResult) {
    if rule.api_version != API_VERSION {
        result.error(
            "apiVersion",
            format!("apiVersion must be '{}', got '{}'", API_VERSION, rule.api_version),
        );
    }
    if rule.kind != INSIGHT_CONFIG_KIND {
        let message = format!("kind must be '{}', got '{}'", INSIGHT_CONFIG_KIND, rule.kind);
        match closest_match(&rule.kind, &[INSIGHT_CONFIG_KIND]) {
            Some(s) => result.error_with_suggestion("kind", message, s),
            None => result.error("kind", message),
        }
    }
    if !is_kebab_case(&rule.metadata.id) {
        result.error(
            "metadata.id",
            format!(
                "id must be kebab-case (lowercase alphanumeric + hyphens), got '{}'",
                rule.metadata.id
            ),
        );
    }
}

// ── Thresholds ──────────────────────────────────────────────────────

pub fn validate_thresholds(rule: &InsightConfigRule, result: &mut ValidationResult) {
    let spec = &rule.spec;

    let offset = spec.calendar.utc_offset_minutes;
    if offset <= -MAX_OFFSET_MINUTES || offset >= MAX_OFFSET_MINUTES {
        result.error(
            "spec.calendar.utc_offset_minutes",
            format!("offset must be within ±{} minutes, got {}", MAX_OFFSET_MINUTES - 1, offset),
        );
    }

    let adherence = &spec.adherence;
    if !(0..=MAX_LATE_THRESHOLD_MINUTES).contains(&adherence.late_threshold_minutes) {
        result.error(
            "spec.adherence.late_threshold_minutes",
            format!(
                "late threshold must be within 0-{} minutes, got {}",
                MAX_LATE_THRESHOLD_MINUTES, adherence.late_threshold_minutes
            ),
        );
    }
    if !(adherence.weekend_bias_margin > 0.0) {
        result.error(
            "spec.adherence.weekend_bias_margin",
            format!("margin must be positive, got {}", adherence.weekend_bias_margin),
        );
    } else if adherence.weekend_bias_margin < 1.0 {
        result.warn(
            "spec.adherence.weekend_bias_margin",
            "a margin below 1.0 flags weekend bias even when weekends are under-represented",
        );
    }

    // Grades must be descending: excellent > good > fair, all within 0..=100.
    let g = &adherence.consistency;
    if !(g.excellent > g.good && g.good > g.fair) {
        result.error(
            "spec.adherence.consistency",
            format!(
                "grades must be descending: excellent({}) > good({}) > fair({})",
                g.excellent, g.good, g.fair
            ),
        );
    }
    if [g.excellent, g.good, g.fair]
        .iter()
        .any(|v| !(0.0..=100.0).contains(v))
    {
        result.error("spec.adherence.consistency", "grades must be within 0-100");
    }

    if !(spec.trend.stable_threshold >= 0.0) {
        result.error(
            "spec.trend.stable_threshold",
            format!("threshold must be non-negative, got {}", spec.trend.stable_threshold),
        );
    }

    let p = &spec.patterns;
    if p.min_samples == 0 {
        result.error("spec.patterns.min_samples", "min_samples must be at least 1");
    } else if p.min_samples < 3 {
        result.warn(
            "spec.patterns.min_samples",
            "min_samples below 3 allows patterns from very sparse data",
        );
    }
    if !(0.0..1.0).contains(&p.min_fraction) {
        result.error(
            "spec.patterns.min_fraction",
            format!("min_fraction must be within [0, 1), got {}", p.min_fraction),
        );
    }
    if !(p.frequency_margin > 0.0) {
        result.error(
            "spec.patterns.frequency_margin",
            format!("frequency_margin must be positive, got {}", p.frequency_margin),
        );
    }
    if !(p.frequency_saturation > 0.0) {
        result.error(
            "spec.patterns.frequency_saturation",
            format!("frequency_saturation must be positive, got {}", p.frequency_saturation),
        );
    }
    if !(1..=MAX_CORRELATION_WINDOW_HOURS).contains(&p.correlation_window_hours) {
        result.error(
            "spec.patterns.correlation_window_hours",
            format!(
                "correlation window must be within 1-{} hours, got {}",
                MAX_CORRELATION_WINDOW_HOURS, p.correlation_window_hours
            ),
        );
    }

    let s = &spec.summary;
    if s.high_severity_threshold > carepulse_core::MAX_SEVERITY {
        result.error(
            "spec.summary.high_severity_threshold",
            format!(
                "threshold must be within 0-{}, got {}",
                carepulse_core::MAX_SEVERITY,
                s.high_severity_threshold
            ),
        );
    }
    if !(0..=MAX_HORIZON_DAYS).contains(&s.upcoming_horizon_days) {
        result.error(
            "spec.summary.upcoming_horizon_days",
            format!(
                "horizon must be within 0-{} days, got {}",
                MAX_HORIZON_DAYS, s.upcoming_horizon_days
            ),
        );
    }
    if !(0.0..=100.0).contains(&s.low_adherence_threshold) {
        result.error(
            "spec.summary.low_adherence_threshold",
            "threshold must be within 0-100",
        );
    }
}

// ── Recommendation table ────────────────────────────────────────────

pub fn validate_recommendations(rule: &InsightConfigRule, result: &mut ValidationResult) {
    let recs = &rule.spec.recommendations;

    if recs.max_count == 0 {
        result.error(
            "spec.recommendations.max_count",
            "max_count must be at least 1",
        );
    }
    if recs.rules.is_empty() {
        result.warn(
            "spec.recommendations.rules",
            "no recommendation rules; reports will carry no recommendations",
        );
    }

    let mut seen_ids = HashSet::new();
    for (i, r) in recs.rules.iter().enumerate() {
        let path = format!("spec.recommendations.rules[{}]", i);
        if !is_kebab_case(&r.id) {
            result.error(
                format!("{}.id", path),
                format!("rule id must be kebab-case, got '{}'", r.id),
            );
        }
        if !seen_ids.insert(r.id.as_str()) {
            result.error(format!("{}.id", path), format!("duplicate rule id '{}'", r.id));
        }
        if r.message.trim().is_empty() {
            result.error(format!("{}.message", path), "message must not be empty");
        }
        validate_condition(&r.when, &format!("{}.when", path), result);
    }
}

fn validate_condition(condition: &Condition, path: &str, result: &mut ValidationResult) {
    match condition {
        Condition::AdherenceBelow { threshold } => {
            if !(0.0..=100.0).contains(threshold) {
                result.error(
                    format!("{}.threshold", path),
                    format!("adherence threshold must be within 0-100, got {}", threshold),
                );
            }
        }
        Condition::All { conditions } | Condition::Any { conditions } => {
            if conditions.is_empty() {
                result.warn(
                    format!("{}.conditions", path),
                    "empty condition list ('all' is always true, 'any' always false)",
                );
            }
            for (i, c) in conditions.iter().enumerate() {
                validate_condition(c, &format!("{}.conditions[{}]", path, i), result);
            }
        }
        Condition::Not { condition } => {
            validate_condition(condition, &format!("{}.condition", path), result);
        }
        Condition::WeekendBias
        | Condition::Trend { .. }
        | Condition::PatternPresent { .. }
        | Condition::NoMissedDoses => {}
    }
}
