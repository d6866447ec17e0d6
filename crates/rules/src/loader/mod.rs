//! Filesystem loader for InsightConfig documents.
//!
//! Parses the YAML, validates it, and compiles it into the engine's
//! [`CompiledInsightConfig`](crate::insight_config::CompiledInsightConfig).
//! A missing path or a disabled document falls back to the built-in defaults.

mod core;
mod error;


pub use self::core::{load_from_path, load_from_str, load_or_default};
pub use self::error::{Result, RuleError};
