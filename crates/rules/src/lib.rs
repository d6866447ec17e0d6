//! YAML-driven insight configuration.
//!
//! This crate provides:
//! - The `InsightConfig` rule document with engine thresholds
//! - The declarative recommendation table and its condition evaluator
//! - Validation with "did you mean" suggestions
//! - A filesystem loader that falls back to built-in defaults

pub mod insight_config;
pub mod loader;
pub mod recommendation;
pub mod schema;
pub mod validation;

pub use insight_config::{CompiledInsightConfig, InsightConfigRule, InsightConfigSpec};
pub use recommendation::{generate_recommendations, Condition, InsightSignals, RecommendationRule};
