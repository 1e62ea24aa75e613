use serde::{Deserialize, Serialize};

use crate::config::PulseConfig;

/// A detected pulse: 1-based index and an inclusive range of 0-based input rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PulseInterval {
    pub index: usize,
    pub start_row: usize,
    pub end_row: usize,
}

impl PulseInterval {
    pub fn contains(&self, row: usize) -> bool {
        row >= self.start_row && row <= self.end_row
    }

    pub fn row_count(&self) -> usize {
        self.end_row + 1 - self.start_row
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmenterState {
    Idle,
    InPulse { start_row: usize },
}

/// What a single sample did to the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    None,
    Start,
    End,
}

/// Pure transition function. Comparisons are strict, so values sitting exactly on a
/// threshold never change state.
pub fn transition(
    state: SegmenterState,
    previous: Option<f64>,
    value: f64,
    config: &PulseConfig,
) -> Transition {
    match state {
        SegmenterState::Idle => match previous {
            Some(prev)
                if prev < config.baseline_threshold && value > config.pulse_start_threshold =>
            {
                Transition::Start
            }
            _ => Transition::None,
        },
        SegmenterState::InPulse { .. } => {
            if value < config.pulse_end_threshold {
                Transition::End
            } else {
                Transition::None
            }
        }
    }
}

/// Segmentation progress threaded through the pass by value.
#[derive(Debug, Clone, PartialEq)]
pub struct Segmentation {
    pub state: SegmenterState,
    pub pulse_count: usize,
    pub intervals: Vec<PulseInterval>,
    previous: Option<f64>,
}

impl Default for Segmentation {
    fn default() -> Self {
        Self {
            state: SegmenterState::Idle,
            pulse_count: 0,
            intervals: Vec::new(),
            previous: None,
        }
    }
}

impl Segmentation {
    /// Advance by one sample at `row`.
    pub fn step(mut self, row: usize, value: f64, config: &PulseConfig) -> Self {
        match transition(self.state, self.previous, value, config) {
            Transition::Start => {
                self.pulse_count += 1;
                self.state = SegmenterState::InPulse { start_row: row };
                tracing::info!(
                    "Pulse {} started at row {}: {:.2} -> {:.2}",
                    self.pulse_count,
                    row,
                    self.previous.unwrap_or(f64::NAN),
                    value
                );
            }
            Transition::End => {
                if let SegmenterState::InPulse { start_row } = self.state {
                    // The falling sample is outside the pulse; the last in-pulse row is `row - 1`.
                    self.close(start_row, row - 1);
                    tracing::info!(
                        "Pulse {} ended at row {}: {:.2} -> {:.2}",
                        self.pulse_count,
                        row - 1,
                        self.previous.unwrap_or(f64::NAN),
                        value
                    );
                }
            }
            Transition::None => {}
        }
        self.previous = Some(value);
        self
    }

    /// Whether `max_pulses` pulses have already closed.
    pub fn is_saturated(&self, config: &PulseConfig) -> bool {
        match config.max_pulses {
            Some(max) => self.state == SegmenterState::Idle && self.intervals.len() >= max,
            None => false,
        }
    }

    /// Close any pulse still open at `last_row` and return the intervals.
    pub fn finish(mut self, last_row: usize) -> Vec<PulseInterval> {
        if let SegmenterState::InPulse { start_row } = self.state {
            tracing::info!(
                "Pulse {} still open at end of data, closed at row {}",
                self.pulse_count,
                last_row
            );
            self.close(start_row, last_row);
        }
        self.intervals
    }

    fn close(&mut self, start_row: usize, end_row: usize) {
        self.intervals.push(PulseInterval {
            index: self.pulse_count,
            start_row,
            end_row,
        });
        self.state = SegmenterState::Idle;
    }
}

/// Split a current series into pulses. Single pass, no look-ahead.
pub fn segment<I>(values: I, config: &PulseConfig) -> Vec<PulseInterval>
where
    I: IntoIterator<Item = f64>,
{
    let mut seg = Segmentation::default();
    let mut last_row = None;

    for (row, value) in values.into_iter().enumerate() {
        if seg.is_saturated(config) {
            tracing::info!("Reached max_pulses, stopping segmentation at row {}", row);
            break;
        }
        seg = seg.step(row, value, config);
        last_row = Some(row);
    }

    let intervals = match last_row {
        Some(last) => seg.finish(last),
        None => Vec::new(),
    };

    if intervals.is_empty() {
        tracing::info!("No pulses detected");
    } else {
        tracing::info!("Total pulses detected: {}", intervals.len());
    }
    intervals
}
