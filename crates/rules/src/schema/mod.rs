//! YAML DSL schema types shared by rule documents.
//!
//! Every document has the same envelope: `apiVersion`, `kind`, `metadata`,
//! then a kind-specific `spec`.

mod metadata;

pub use metadata::*;

/// The only API version this crate reads.
pub const API_VERSION: &str = "v1";
