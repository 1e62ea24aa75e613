use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ReportError, Result};

/// One acquisition tick: relative time in seconds and the measured value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub time: f64,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChannelRole {
    /// The monitored current; pulses are segmented on this channel.
    Current,
    /// Secondary measurement (clamp voltage) summarised over each pulse.
    Companion,
}

impl ChannelRole {
    pub fn label(&self) -> &'static str {
        match self {
            ChannelRole::Current => "current",
            ChannelRole::Companion => "companion voltage",
        }
    }
}

impl fmt::Display for ChannelRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Channel {
    pub name: String,
    pub unit: String,
    pub role: ChannelRole,
    pub samples: Vec<Sample>,
}

impl Channel {
    /// Zip a shared time base with this channel's values.
    pub fn new(
        name: String,
        unit: String,
        role: ChannelRole,
        time: &[f64],
        values: &[f64],
    ) -> Self {
        let samples = time
            .iter()
            .zip(values.iter())
            .map(|(&time, &value)| Sample { time, value })
            .collect();
        Self {
            name,
            unit,
            role,
            samples,
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn value(&self, row: usize) -> Option<f64> {
        self.samples.get(row).map(|s| s.value)
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().map(|s| s.value)
    }
}

/// A non-numeric input column (Date, Time Stamp UTC, ...) carried through to the report verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextColumn {
    pub name: String,
    pub values: Vec<String>,
}

/// Channels that share one time base, plus pass-through annotation columns.
#[derive(Debug, Clone, Default)]
pub struct ChannelSet {
    channels: Vec<Channel>,
    annotations: Vec<TextColumn>,
}

impl ChannelSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a channel. All channels must have the same sample count.
    pub fn push_channel(&mut self, channel: Channel) -> Result<()> {
        if let Some(expected) = self.expected_len() {
            if channel.len() != expected {
                return Err(ReportError::ChannelLengthMismatch {
                    name: channel.name,
                    expected,
                    actual: channel.samples.len(),
                });
            }
        }
        self.channels.retain(|c| c.role != channel.role);
        self.channels.push(channel);
        Ok(())
    }

    pub fn push_annotation(&mut self, column: TextColumn) -> Result<()> {
        if let Some(expected) = self.expected_len() {
            if column.values.len() != expected {
                return Err(ReportError::ChannelLengthMismatch {
                    name: column.name,
                    expected,
                    actual: column.values.len(),
                });
            }
        }
        self.annotations.push(column);
        Ok(())
    }

    fn expected_len(&self) -> Option<usize> {
        self.channels
            .first()
            .map(|c| c.len())
            .or_else(|| self.annotations.first().map(|a| a.values.len()))
    }

    pub fn channel(&self, role: ChannelRole) -> Option<&Channel> {
        self.channels.iter().find(|c| c.role == role)
    }

    /// The current channel, which every pipeline run requires.
    pub fn current(&self) -> Result<&Channel> {
        self.channel(ChannelRole::Current)
            .ok_or(ReportError::MissingChannel {
                role: ChannelRole::Current,
            })
    }

    pub fn companion(&self) -> Option<&Channel> {
        self.channel(ChannelRole::Companion)
    }

    pub fn annotations(&self) -> &[TextColumn] {
        &self.annotations
    }

    pub fn sample_count(&self) -> usize {
        self.expected_len().unwrap_or(0)
    }
}
