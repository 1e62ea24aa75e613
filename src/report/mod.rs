pub mod address;
pub mod chart;
pub mod formula;
pub mod grid;
pub mod layout;

use serde::{Deserialize, Serialize};

use crate::processing::analysis::PulseAnalysis;
use chart::ChartSpec;
use layout::ReportLayout;

/// Everything a document writer needs for one input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub layout: ReportLayout,
    pub chart: ChartSpec,
    pub analysis: PulseAnalysis,
}

impl Report {
    pub fn to_json(&self) -> crate::error::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
