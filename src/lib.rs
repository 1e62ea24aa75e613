//! Pulse segmentation and spreadsheet report layout for current/voltage logs.
//!
//! The pipeline runs strictly in one direction: channels → [`processing::segmenter`] →
//! [`processing::statistics`] → [`report::layout`] → [`report::chart`]. Nothing downstream
//! mutates upstream data, and no formula is evaluated here; the layout only records where
//! each formula lives and what it reads.

pub mod config;
pub mod data;
pub mod error;
pub mod processing;
pub mod report;
pub mod state;

use std::path::Path;

use config::AnalyzerConfig;
use error::Result;
use processing::analysis::PulseAnalysis;
use processing::segmenter::segment;
use processing::statistics::PulseStats;
use report::chart::build_chart;
use report::layout::layout;
use report::Report;
use state::channel::ChannelSet;

/// Run the full pipeline on an in-memory channel set.
///
/// Any error aborts the whole run; no partial report is returned.
pub fn generate_report(channels: &ChannelSet, config: &AnalyzerConfig) -> Result<Report> {
    let current = channels.current()?;
    let companion = channels.companion();

    let pulses = segment(current.values(), &config.pulse);
    let stats = pulses
        .iter()
        .map(|p| PulseStats::compute(current, companion, p))
        .collect::<Result<Vec<_>>>()?;

    let layout = layout(channels, &pulses, &stats, &config.layout)?;
    let chart = build_chart(&layout.raw_data, &layout.sheet_name, &config.chart)?;
    let analysis = PulseAnalysis::new(current, &stats);

    Ok(Report {
        layout,
        chart,
        analysis,
    })
}

/// Load a CSV/Excel file and run the pipeline on it.
pub fn analyze_file(path: &Path, config: &AnalyzerConfig) -> Result<Report> {
    let loaded = data::loader::load_file(path)?;
    let channels = data::channels::build_channel_set(loaded, &config.channels)?;
    generate_report(&channels, config)
}
