use chrono::NaiveDate;
use thiserror::Error;

/// Failures an insight operation can report to its caller.
///
/// Sparse data is never an error: detectors degrade to stable trends and
/// empty pattern lists instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InsightError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid window: start {start} is after end {end}")]
    InvalidWindow { start: NaiveDate, end: NaiveDate },
}

impl InsightError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        InsightError::InvalidInput(msg.into())
    }

    /// Stable machine-readable tag for hosting layers.
    pub fn kind(&self) -> &'static str {
        match self {
            InsightError::InvalidInput(_) => "invalid_input",
            InsightError::InvalidWindow { .. } => "invalid_window",
        }
    }
}

pub type Result<T> = std::result::Result<T, InsightError>;
