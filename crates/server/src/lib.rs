//! HTTP hosting for the insight engine.
//!
//! Thin adapter: decodes JSON requests, runs the matching
//! [`InsightEngine`](carepulse_compute::InsightEngine) operation and encodes
//! the report. No analytics happen here.

pub mod api;
pub mod router;
pub mod state;

pub use router::build_router;
pub use state::AppState;
