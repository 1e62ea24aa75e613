use serde::{Deserialize, Serialize};

use crate::processing::statistics::{PulseStats, SeriesStats};
use crate::state::channel::Channel;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileInfo {
    pub total_samples: usize,
    /// Last relative time in the series, in seconds.
    pub duration: f64,
    /// Samples per second; `None` when the series has no positive duration.
    pub sampling_rate: Option<f64>,
}

impl FileInfo {
    pub fn from_channel(current: &Channel) -> Self {
        let duration = current
            .samples
            .iter()
            .map(|s| s.time)
            .filter(|t| t.is_finite())
            .fold(f64::NEG_INFINITY, f64::max);
        let duration = if duration.is_finite() { duration } else { 0.0 };
        let sampling_rate = (duration > 0.0).then(|| current.len() as f64 / duration);
        Self {
            total_samples: current.len(),
            duration,
            sampling_rate,
        }
    }
}

/// Peak-current overview of one input: per-pulse statistics plus aggregate figures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PulseAnalysis {
    pub current_unit: String,
    pub total_pulses: usize,
    pub pulses: Vec<PulseStats>,
    pub file_info: FileInfo,
    /// Spread of the per-pulse peak currents; `None` when no pulse was detected.
    pub peak_overview: Option<SeriesStats>,
}

impl PulseAnalysis {
    pub fn new(current: &Channel, stats: &[PulseStats]) -> Self {
        let peaks: Vec<f64> = stats.iter().map(|s| s.peak_value).collect();
        Self {
            current_unit: current.unit.clone(),
            total_pulses: stats.len(),
            pulses: stats.to_vec(),
            file_info: FileInfo::from_channel(current),
            peak_overview: SeriesStats::compute(&peaks),
        }
    }

    /// Human-readable summary for the command line.
    pub fn report(&self) -> String {
        let unit = &self.current_unit;
        let mut out = format!(
            "Samples: {}  Duration: {:.3} s",
            self.file_info.total_samples, self.file_info.duration
        );
        if let Some(rate) = self.file_info.sampling_rate {
            out.push_str(&format!("  Rate: {rate:.1} Hz"));
        }
        out.push('\n');
        out.push_str(&format!("Pulses detected: {}\n", self.total_pulses));

        for p in &self.pulses {
            out.push_str(&format!(
                "  Pulse {}: peak {:.2} {unit} at {:.3} s, {:.3}..{:.3} s ({:.3} s)",
                p.index, p.peak_value, p.peak_time, p.start_time, p.end_time, p.duration
            ));
            if let Some(min_v) = p.min_companion {
                out.push_str(&format!(", min {min_v:.2} V"));
            }
            if let Some(j) = p.energy_estimate {
                out.push_str(&format!(", ~{j:.2} J"));
            }
            out.push('\n');
        }

        if let Some(overview) = &self.peak_overview {
            out.push_str(&overview.report("Peak current", unit));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::channel::ChannelRole;

    fn stats(index: usize, peak_value: f64) -> PulseStats {
        PulseStats {
            index,
            sample_count: 2,
            peak_value,
            peak_time: 0.0,
            start_time: 0.0,
            end_time: 0.1,
            duration: 0.1,
            min_companion: None,
            energy_estimate: None,
        }
    }

    #[test]
    fn file_info_rate_from_last_time() {
        let time = [0.0, 0.5, 1.0, 1.5, 2.0];
        let current = Channel::new(
            "Amp".to_string(),
            "A".to_string(),
            ChannelRole::Current,
            &time,
            &[0.0; 5],
        );
        let analysis = PulseAnalysis::new(&current, &[stats(1, 200.0), stats(2, 100.0)]);
        assert_eq!(analysis.file_info.total_samples, 5);
        assert_eq!(analysis.file_info.duration, 2.0);
        assert_eq!(analysis.file_info.sampling_rate, Some(2.5));

        let overview = analysis.peak_overview.unwrap();
        assert_eq!(overview.max, 200.0);
        assert_eq!(overview.min, 100.0);
        assert_eq!(overview.mean, 150.0);
    }

    #[test]
    fn no_pulses_means_no_overview() {
        let current = Channel::new(
            "Amp".to_string(),
            "A".to_string(),
            ChannelRole::Current,
            &[0.0],
            &[1.0],
        );
        let analysis = PulseAnalysis::new(&current, &[]);
        assert_eq!(analysis.total_pulses, 0);
        assert!(analysis.peak_overview.is_none());
        assert_eq!(analysis.file_info.sampling_rate, None);
        assert!(analysis.report().contains("Pulses detected: 0"));
    }
}
