//! Parse, validate and compile an InsightConfig document.

use std::fs;
use std::path::Path;

use tracing::{info, warn};

use crate::insight_config::{CompiledInsightConfig, InsightConfigRule};
use crate::validation::validate_insight_config;

use super::error::{Result, RuleError};

/// Parse and validate a YAML document.
///
/// Validation errors reject the document; warnings are logged and the
/// document is accepted. A disabled document compiles to the built-in
/// defaults.
pub fn load_from_str(yaml: &str) -> Result<CompiledInsightConfig> {
    let rule: InsightConfigRule = serde_yaml::from_str(yaml)?;

    let result = validate_insight_config(&rule);
    for w in &result.warnings {
        warn!(rule_id = %rule.metadata.id, path = %w.path, "{}", w.message);
    }
    if !result.valid {
        return Err(RuleError::Validation(result.error_summary()));
    }

    if !rule.metadata.enabled {
        warn!(rule_id = %rule.metadata.id, "insight config disabled, using built-in defaults");
        return Ok(InsightConfigRule::builtin().compile());
    }

    Ok(rule.compile())
}

/// Read a YAML document from disk and load it.
pub fn load_from_path(path: &Path) -> Result<CompiledInsightConfig> {
    let content = fs::read_to_string(path)?;
    let config = load_from_str(&content)?;
    info!(
        path = %path.display(),
        rules = config.recommendations.rules.len(),
        "loaded insight config"
    );
    Ok(config)
}

/// Load from `path` when given, otherwise return the built-in defaults.
pub fn load_or_default(path: Option<&Path>) -> Result<CompiledInsightConfig> {
    match path {
        Some(p) => load_from_path(p),
        None => {
            info!("no insight config path set, using built-in defaults");
            Ok(InsightConfigRule::builtin().compile())
        }
    }
}
