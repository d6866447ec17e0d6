//! InsightConfig rule kind: calendar, adherence, trend, pattern and summary
//! thresholds plus the recommendation table.
//!
//! Every section and field has a default, so a document only needs to spell
//! out what it overrides. The defaults are the documented engine constants.

use serde::{Deserialize, Serialize};

use crate::recommendation::{default_rules, RecommendationRule};
use crate::schema::{CommonMetadata, API_VERSION};

/// `kind` value of an InsightConfig document.
pub const INSIGHT_CONFIG_KIND: &str = "InsightConfig";

// ── YAML-level types ────────────────────────────────────────────────

/// Top-level InsightConfig rule document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct InsightConfigRule {
    #[serde(rename = "apiVersion")]
    pub api_version: String,
    pub kind: String,
    pub metadata: CommonMetadata,
    #[serde(default)]
    pub spec: InsightConfigSpec,
}

/// Body of an InsightConfig rule.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct InsightConfigSpec {
    pub calendar: CalendarParams,
    pub adherence: AdherenceParams,
    pub trend: TrendParams,
    pub patterns: PatternParams,
    pub summary: SummaryParams,
    pub recommendations: RecommendationParams,
}

/// Reference offset for dates, hours of day and weekends.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct CalendarParams {
    /// Minutes east of UTC. 0 means calendar dates are UTC dates.
    pub utc_offset_minutes: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct AdherenceParams {
    /// A dose taken more than this many minutes after schedule is late.
    pub late_threshold_minutes: i64,
    /// Weekend bias when the weekend share of missed doses exceeds the
    /// weekend share of window days times this factor.
    pub weekend_bias_margin: f64,
    pub consistency: ConsistencyGrades,
}

impl Default for AdherenceParams {
    fn default() -> Self {
        Self {
            late_threshold_minutes: 30,
            weekend_bias_margin: 1.5,
            consistency: ConsistencyGrades::default(),
        }
    }
}

/// Lower bounds (percent) of the adherence consistency grades.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ConsistencyGrades {
    pub excellent: f64,
    pub good: f64,
    pub fair: f64,
}

impl Default for ConsistencyGrades {
    fn default() -> Self {
        Self {
            excellent: 95.0,
            good: 85.0,
            fair: 70.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct TrendParams {
    /// Slopes within ±this many severity points per day are stable.
    pub stable_threshold: f64,
}

impl Default for TrendParams {
    fn default() -> Self {
        Self {
            stable_threshold: 0.05,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct PatternParams {
    /// Below this many reports no pattern is ever emitted.
    pub min_samples: usize,
    /// Share of reports a time-of-day bucket must exceed.
    pub min_fraction: f64,
    /// Minimum relative increase (0.5 = +50%) for a frequency pattern.
    pub frequency_margin: f64,
    /// Relative increase mapped to confidence 1.0.
    pub frequency_saturation: f64,
    /// How long after a missed dose a report counts toward correlation.
    pub correlation_window_hours: i64,
}

impl Default for PatternParams {
    fn default() -> Self {
        Self {
            min_samples: 3,
            min_fraction: 0.5,
            frequency_margin: 0.5,
            frequency_saturation: 2.0,
            correlation_window_hours: 24,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SummaryParams {
    /// Reports at or above this severity are raised as concerns.
    pub high_severity_threshold: u8,
    /// Upcoming appointments within this many days get a prep suggestion.
    pub upcoming_horizon_days: i64,
    /// Adherence below this rate triggers a schedule-simplification suggestion.
    pub low_adherence_threshold: f64,
}

impl Default for SummaryParams {
    fn default() -> Self {
        Self {
            high_severity_threshold: 7,
            upcoming_horizon_days: 3,
            low_adherence_threshold: 90.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RecommendationParams {
    pub max_count: usize,
    /// Evaluated in order; earlier rules win when `max_count` truncates.
    pub rules: Vec<RecommendationRule>,
}

impl Default for RecommendationParams {
    fn default() -> Self {
        Self {
            max_count: 5,
            rules: default_rules(),
        }
    }
}

// ── Compiled type ───────────────────────────────────────────────────

/// Pre-compiled insight config (the body is already typed).
pub type CompiledInsightConfig = InsightConfigSpec;

impl InsightConfigRule {
    /// The document equivalent to the built-in defaults.
    pub fn builtin() -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            kind: INSIGHT_CONFIG_KIND.to_string(),
            metadata: CommonMetadata {
                id: "insight-default".to_string(),
                name: "Default insight thresholds".to_string(),
                description: None,
                tags: None,
                enabled: true,
            },
            spec: InsightConfigSpec::default(),
        }
    }

    /// Compile the YAML config.
    pub fn compile(&self) -> CompiledInsightConfig {
        self.spec.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recommendation::Condition;

    #[test]
    fn parse_shipped_insight_config() {
        let yaml = include_str!("../../../data/rules/insight-config.yml");
        let rule: InsightConfigRule = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(rule.kind, "InsightConfig");
        assert_eq!(rule.spec.adherence.late_threshold_minutes, 30);
        assert_eq!(rule.spec.patterns.min_samples, 3);
        assert_eq!(rule.spec.recommendations.rules.len(), 5);
    }

    #[test]
    fn shipped_config_matches_builtin_defaults() {
        let yaml = include_str!("../../../data/rules/insight-config.yml");
        let rule: InsightConfigRule = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(rule.compile(), InsightConfigSpec::default());
    }

    #[test]
    fn partial_document_fills_defaults() {
        let yaml = r#"
apiVersion: v1
kind: InsightConfig
metadata:
  id: clinic-evening
  name: Clinic evening shift
spec:
  calendar:
    utc_offset_minutes: -300
  trend:
    stable_threshold: 0.1
  recommendations:
    max_count: 2
"#;
        let rule: InsightConfigRule = serde_yaml::from_str(yaml).unwrap();
        let spec = rule.compile();
        assert_eq!(spec.calendar.utc_offset_minutes, -300);
        assert_eq!(spec.trend.stable_threshold, 0.1);
        assert_eq!(spec.recommendations.max_count, 2);
        assert_eq!(spec.recommendations.rules, default_rules());
        assert_eq!(spec.adherence, AdherenceParams::default());
        assert!(rule.metadata.enabled);
    }

    #[test]
    fn unknown_fields_rejected() {
        let yaml = r#"
apiVersion: v1
kind: InsightConfig
metadata:
  id: typo
  name: Typo
spec:
  trend:
    stable_treshold: 0.1
"#;
        assert!(serde_yaml::from_str::<InsightConfigRule>(yaml).is_err());
    }

    #[test]
    fn custom_rule_table() {
        let yaml = r#"
apiVersion: v1
kind: InsightConfig
metadata:
  id: strict
  name: Strict adherence
spec:
  recommendations:
    rules:
      - id: strict-adherence
        when:
          check: adherence_below
          threshold: 98
        message: Review your dose schedule with your pharmacist
"#;
        let rule: InsightConfigRule = serde_yaml::from_str(yaml).unwrap();
        let rules = &rule.spec.recommendations.rules;
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].when, Condition::AdherenceBelow { threshold: 98.0 });
        assert_eq!(rule.spec.recommendations.max_count, 5);
    }

    #[test]
    fn builtin_round_trip() {
        let rule = InsightConfigRule::builtin();
        let serialized = serde_yaml::to_string(&rule).unwrap();
        let rule2: InsightConfigRule = serde_yaml::from_str(&serialized).unwrap();
        assert_eq!(rule, rule2);
    }
}
