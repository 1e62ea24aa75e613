use thiserror::Error;

use crate::state::channel::ChannelRole;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("required {role} channel not found in input")]
    MissingChannel { role: ChannelRole },
    #[error("pulse {index} has an empty row range ({start_row}..={end_row})")]
    EmptyInterval {
        index: usize,
        start_row: usize,
        end_row: usize,
    },
    #[error("pulse {index} ends at row {end_row} but the series only has {len} samples")]
    IntervalOutOfBounds { index: usize, end_row: usize, len: usize },
    #[error("raw-data block has no rows; cannot bind chart")]
    EmptyDataset,
    #[error("channel '{name}' has {actual} samples, expected {expected}")]
    ChannelLengthMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },
    #[error("summary reference for pulse {pulse} '{statistic}' does not resolve to a raw-data formula")]
    DanglingReference { pulse: usize, statistic: String },
    #[error("unsupported file format: .{0}")]
    UnsupportedFormat(String),
    #[error("cannot load input: {0}")]
    Load(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ReportError>;
