use serde::Serialize;
use tracing::debug;

use carepulse_core::{SymptomReport, TrendDirection};
use carepulse_rules::insight_config::TrendParams;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Direction and strength of symptom severity over a window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SymptomTrend {
    pub average_severity: f64,
    pub trend: TrendDirection,
    /// Severity points per day.
    pub slope: f64,
}

impl SymptomTrend {
    fn flat(average_severity: f64) -> Self {
        Self {
            average_severity,
            trend: TrendDirection::Stable,
            slope: 0.0,
        }
    }
}

/// Least-squares trend over severity against elapsed days.
pub struct TrendDetector {
    /// Slopes within ±this many points per day are stable.
    stable_threshold: f64,
}

impl Default for TrendDetector {
    fn default() -> Self {
        Self::from_params(&TrendParams::default())
    }
}

impl TrendDetector {
    pub fn from_params(params: &TrendParams) -> Self {
        Self {
            stable_threshold: params.stable_threshold,
        }
    }

    /// Reports must be in chronological order.
    pub fn detect(&self, reports: &[SymptomReport]) -> SymptomTrend {
        let n = reports.len();
        if n == 0 {
            return SymptomTrend::flat(0.0);
        }

        let severities: Vec<f64> = reports.iter().map(|r| f64::from(r.severity)).collect();
        let average = severities.iter().sum::<f64>() / n as f64;

        if n < 2 || reports.iter().all(|r| r.severity == reports[0].severity) {
            return SymptomTrend::flat(average);
        }

        let origin = reports[0].time;
        let days: Vec<f64> = reports
            .iter()
            .map(|r| (r.time - origin).num_milliseconds() as f64 / MILLIS_PER_DAY)
            .collect();
        let mean_day = days.iter().sum::<f64>() / n as f64;

        let mut sxx = 0.0;
        let mut sxy = 0.0;
        for (x, y) in days.iter().zip(&severities) {
            let dx = x - mean_day;
            sxx += dx * dx;
            sxy += dx * (y - average);
        }

        // All reports at the same instant.
        if sxx == 0.0 {
            return SymptomTrend::flat(average);
        }

        let slope = sxy / sxx;
        let trend = if slope > self.stable_threshold {
            TrendDirection::Worsening
        } else if slope < -self.stable_threshold {
            TrendDirection::Improving
        } else {
            TrendDirection::Stable
        };

        debug!(reports = n, slope, average, trend = %trend, "symptom trend detected");
        SymptomTrend {
            average_severity: average,
            trend,
            slope,
        }
    }
}
