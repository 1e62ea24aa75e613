use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::report::chart::ChartConfig;

/// Top-level analyzer settings. Every field has a default, so an empty JSON object is valid.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    pub channels: ChannelConfig,
    pub pulse: PulseConfig,
    pub layout: LayoutConfig,
    pub chart: ChartConfig,
}

impl AnalyzerConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&json)?;
        tracing::debug!("Loaded analyzer config from {:?}", path);
        Ok(config)
    }
}

/// How input columns map onto channels. Unset names fall back to header inference.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    pub time_column: Option<String>,
    pub current_column: Option<String>,
    pub companion_column: Option<String>,
    /// Columns removed before anything else looks at the input.
    pub drop_columns: Vec<String>,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            time_column: None,
            current_column: None,
            companion_column: None,
            drop_columns: vec!["Chn 1 Events".to_string()],
        }
    }
}

/// Hysteresis thresholds for pulse segmentation, in the current channel's unit.
///
/// `pulse_end_threshold` is expected to sit below `pulse_start_threshold`; the segmenter
/// does not check this.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PulseConfig {
    pub baseline_threshold: f64,
    pub pulse_start_threshold: f64,
    pub pulse_end_threshold: f64,
    /// Stop segmenting once this many pulses have closed. `None` scans the whole series.
    pub max_pulses: Option<usize>,
}

impl Default for PulseConfig {
    fn default() -> Self {
        Self {
            baseline_threshold: 10.0,
            pulse_start_threshold: 50.0,
            pulse_end_threshold: 20.0,
            max_pulses: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Only the first N pulses get summary rows. Every pulse is still labelled in the raw data.
    pub summary_limit: Option<usize>,
    /// Blank rows between the summary table and the raw-data header.
    pub spacer_rows: usize,
    pub sheet_name: String,
    pub time_label: String,
    pub current_label: String,
    pub companion_label: String,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            summary_limit: None,
            spacer_rows: 3,
            sheet_name: "Sheet1".to_string(),
            time_label: "Relative Time".to_string(),
            current_label: "Current [A]".to_string(),
            companion_label: "Clamp [V]".to_string(),
        }
    }
}
