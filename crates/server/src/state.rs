use carepulse_compute::InsightEngine;

/// Shared, read-only state behind every handler.
pub struct AppState {
    pub engine: InsightEngine,
}

impl AppState {
    pub fn new(engine: InsightEngine) -> Self {
        Self { engine }
    }
}
