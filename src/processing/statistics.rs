use serde::{Deserialize, Serialize};

use crate::error::{ReportError, Result};
use crate::processing::segmenter::PulseInterval;
use crate::state::channel::Channel;

/// Divisor of the energy proxy `mean(V) * mean(I) * n / 100`. The value is inherited from the
/// bench report this tool replaces; it is an approximation, not a calibrated integral.
pub const ENERGY_DIVISOR: f64 = 100.0;

/// Per-pulse statistics, computed once from the pulse's row range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PulseStats {
    pub index: usize,
    /// Rows in the interval, blank cells included.
    pub sample_count: usize,
    pub peak_value: f64,
    pub peak_time: f64,
    pub start_time: f64,
    pub end_time: f64,
    pub duration: f64,
    /// Minimum of the companion channel over the pulse; absent when there is no companion.
    pub min_companion: Option<f64>,
    pub energy_estimate: Option<f64>,
}

impl PulseStats {
    /// Compute statistics for `interval` over `current` and an optional companion channel.
    pub fn compute(
        current: &Channel,
        companion: Option<&Channel>,
        interval: &PulseInterval,
    ) -> Result<Self> {
        if interval.start_row > interval.end_row {
            return Err(ReportError::EmptyInterval {
                index: interval.index,
                start_row: interval.start_row,
                end_row: interval.end_row,
            });
        }
        if interval.end_row >= current.len() {
            return Err(ReportError::IntervalOutOfBounds {
                index: interval.index,
                end_row: interval.end_row,
                len: current.len(),
            });
        }

        let rows = &current.samples[interval.start_row..=interval.end_row];

        // Strict `>` keeps the earliest sample on ties.
        let mut peak = rows[0];
        for s in &rows[1..] {
            if s.value > peak.value || (peak.value.is_nan() && !s.value.is_nan()) {
                peak = *s;
            }
        }

        let start_time = rows[0].time;
        let end_time = rows[rows.len() - 1].time;
        let sample_count = rows.len();

        let companion_rows = companion
            .filter(|c| interval.end_row < c.len())
            .map(|c| &c.samples[interval.start_row..=interval.end_row]);

        let min_companion = companion_rows.and_then(|rows| {
            rows.iter()
                .map(|s| s.value)
                .filter(|v| v.is_finite())
                .reduce(f64::min)
        });

        // Blank cells are skipped the way AVERAGE and COUNT skip them in the sheet.
        let energy_estimate = companion_rows.and_then(|comp| {
            let (mean_companion, _) = finite_mean(comp.iter().map(|s| s.value))?;
            let (mean_current, current_count) = finite_mean(rows.iter().map(|s| s.value))?;
            Some(mean_companion * mean_current * current_count as f64 / ENERGY_DIVISOR)
        });

        Ok(PulseStats {
            index: interval.index,
            sample_count,
            peak_value: peak.value,
            peak_time: peak.time,
            start_time,
            end_time,
            duration: end_time - start_time,
            min_companion,
            energy_estimate,
        })
    }
}

/// Mean and count of the finite values.
fn finite_mean(values: impl Iterator<Item = f64>) -> Option<(f64, usize)> {
    let (sum, count) = values
        .filter(|v| v.is_finite())
        .fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    if count == 0 {
        None
    } else {
        Some((sum / count as f64, count))
    }
}

/// Statistics for a plain value series
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeriesStats {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub peak_to_peak: f64,
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
}

impl SeriesStats {
    /// Compute statistics from values, filtering out NaN.
    pub fn compute(y: &[f64]) -> Option<Self> {
        let mut vals: Vec<f64> = y.iter().copied().filter(|v| v.is_finite()).collect();
        if vals.is_empty() {
            return None;
        }

        let count = vals.len();
        let min = vals.iter().copied().fold(f64::INFINITY, f64::min);
        let max = vals.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mean = vals.iter().sum::<f64>() / count as f64;

        vals.sort_by(|a, b| a.total_cmp(b));
        let median = if count % 2 == 0 {
            (vals[count / 2 - 1] + vals[count / 2]) / 2.0
        } else {
            vals[count / 2]
        };

        let variance = vals.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / count as f64;

        Some(SeriesStats {
            count,
            min,
            max,
            peak_to_peak: max - min,
            mean,
            median,
            std_dev: variance.sqrt(),
        })
    }

    /// Format as a multi-line report string.
    pub fn report(&self, label: &str, unit: &str) -> String {
        format!(
            "{label}:\n  Count: {}\n  Min: {:.2} {unit}\n  Max: {:.2} {unit}\n  Mean: {:.2} {unit}\n  Median: {:.2} {unit}\n  Std Dev: {:.2} {unit}\n",
            self.count, self.min, self.max, self.mean, self.median, self.std_dev
        )
    }
}
