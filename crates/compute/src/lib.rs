pub mod adherence;
pub mod appointment;
pub mod engine;
pub mod pattern;
pub mod report;
pub mod request;
pub mod trend;

pub use adherence::{AdherenceScore, AdherenceScorer, Consistency, DoseOutcome};
pub use engine::InsightEngine;
pub use pattern::{DayPart, PatternDetector};
pub use report::{
    AdherenceReport, AppointmentSuggestionReport, DailySummary, SymptomPatternReport,
    WeeklySummary,
};
pub use trend::{SymptomTrend, TrendDetector};
