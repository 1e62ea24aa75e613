//! Report layout: where every value and formula lands in the output sheet.
//!
//! Sheet order, top to bottom: one blank row, the summary header, one row per
//! summarised pulse, `spacer_rows` blank rows, the raw-data header, the raw data.
//! The first raw-data row is the single [`RowOffset`] every raw reference goes through.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::LayoutConfig;
use crate::error::{ReportError, Result};
use crate::processing::segmenter::PulseInterval;
use crate::processing::statistics::PulseStats;
use crate::report::address::{CellAddress, CellRange, Region, RowOffset};
use crate::report::formula::{Formula, Statistic};
use crate::state::channel::{ChannelRole, ChannelSet};

const SUMMARY_HEADER_ROW: usize = 1;
const SUMMARY_FIRST_COLUMN: usize = 1;

/// Column positions of the raw-data block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawColumns {
    pub time: usize,
    pub annotations: Vec<usize>,
    pub companion: Option<usize>,
    pub current: usize,
    pub pulse: usize,
    pub value: usize,
    pub description: usize,
}

impl RawColumns {
    pub fn new(annotation_count: usize, has_companion: bool) -> Self {
        let annotations: Vec<usize> = (1..=annotation_count).collect();
        let mut next = annotation_count + 1;
        let companion = has_companion.then(|| {
            next += 1;
            next - 1
        });
        let current = next;
        Self {
            time: 0,
            annotations,
            companion,
            current,
            pulse: current + 1,
            value: current + 2,
            description: current + 3,
        }
    }

    pub fn for_role(&self, role: ChannelRole) -> Option<usize> {
        match role {
            ChannelRole::Current => Some(self.current),
            ChannelRole::Companion => self.companion,
        }
    }

    pub fn width(&self) -> usize {
        self.description + 1
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRow {
    pub input_row: usize,
    pub output_row: usize,
    pub time: f64,
    pub annotations: Vec<String>,
    pub companion: Option<f64>,
    pub current: f64,
    pub pulse: Option<usize>,
    pub formula: Option<Formula>,
    pub description: Option<Statistic>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDataBlock {
    pub header_row: usize,
    pub headers: Vec<String>,
    pub columns: RawColumns,
    pub offset: RowOffset,
    pub rows: Vec<RawRow>,
}

impl RawDataBlock {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The whole data span of `column`, or `None` when there are no rows.
    pub fn column_range(&self, column: usize) -> Option<CellRange> {
        let first = self.offset.first_data_row();
        (!self.rows.is_empty()).then(|| {
            CellRange::column_span(Region::RawData, column, first, first + self.rows.len() - 1)
        })
    }

    pub fn row_at(&self, output_row: usize) -> Option<&RawRow> {
        self.offset
            .to_input_row(output_row)
            .and_then(|input| self.rows.get(input))
    }

    /// The formula populating `addr`, if any.
    pub fn formula_at(&self, addr: &CellAddress) -> Option<&Formula> {
        if addr.region != Region::RawData || addr.column != self.columns.value {
            return None;
        }
        self.row_at(addr.row).and_then(|r| r.formula.as_ref())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SummaryCell {
    Blank,
    Number(f64),
    Formula(Formula),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRow {
    pub output_row: usize,
    pub pulse_index: usize,
    pub cells: Vec<SummaryCell>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryBlock {
    pub header_row: usize,
    pub first_column: usize,
    pub headers: Vec<String>,
    pub rows: Vec<SummaryRow>,
}

impl SummaryBlock {
    fn headers() -> Vec<String> {
        let mut headers = vec!["Pulse #".to_string()];
        headers.extend(Statistic::ALL.iter().map(|s| s.label().to_string()));
        headers.push("Peak Time [s]".to_string());
        headers.push("Duration [s]".to_string());
        headers
    }

    /// Column of the reference cell for `statistic`.
    pub fn statistic_column(&self, statistic: Statistic) -> usize {
        let pos = Statistic::ALL
            .iter()
            .position(|s| *s == statistic)
            .unwrap_or(0);
        self.first_column + 1 + pos
    }
}

/// `(pulse, statistic) -> address` of the raw-data formula computing it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormulaLocationTable {
    entries: BTreeMap<usize, BTreeMap<Statistic, CellAddress>>,
}

impl FormulaLocationTable {
    pub fn insert(&mut self, pulse: usize, statistic: Statistic, addr: CellAddress) {
        self.entries.entry(pulse).or_default().insert(statistic, addr);
    }

    pub fn get(&self, pulse: usize, statistic: Statistic) -> Option<CellAddress> {
        self.entries
            .get(&pulse)
            .and_then(|stats| stats.get(&statistic))
            .copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, Statistic, CellAddress)> + '_ {
        self.entries
            .iter()
            .flat_map(|(&pulse, stats)| stats.iter().map(move |(&s, &a)| (pulse, s, a)))
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(|s| s.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportLayout {
    pub sheet_name: String,
    pub row_offset: RowOffset,
    pub formula_locations: FormulaLocationTable,
    pub summary: SummaryBlock,
    pub raw_data: RawDataBlock,
}

impl ReportLayout {
    /// Check the formula location table against both blocks: every entry and every summary
    /// reference must land on a raw-data formula that does not read its own cell.
    pub fn verify(&self) -> Result<()> {
        for (pulse, statistic, addr) in self.formula_locations.iter() {
            match self.raw_data.formula_at(&addr) {
                Some(f) if !f.reads(&addr) => {}
                _ => {
                    return Err(ReportError::DanglingReference {
                        pulse,
                        statistic: statistic.to_string(),
                    })
                }
            }
        }

        for row in &self.summary.rows {
            for statistic in Statistic::ALL {
                let col = self.summary.statistic_column(statistic) - self.summary.first_column;
                if let Some(SummaryCell::Formula(Formula::Reference(target))) = row.cells.get(col) {
                    let expected = self.formula_locations.get(row.pulse_index, statistic);
                    if expected != Some(*target) || self.raw_data.formula_at(target).is_none() {
                        return Err(ReportError::DanglingReference {
                            pulse: row.pulse_index,
                            statistic: statistic.to_string(),
                        });
                    }
                }
            }
        }
        Ok(())
    }
}

/// Lay out the report for `pulses` (already segmented) and their `stats`.
pub fn layout(
    channels: &ChannelSet,
    pulses: &[PulseInterval],
    stats: &[PulseStats],
    config: &LayoutConfig,
) -> Result<ReportLayout> {
    let current = channels.current()?;
    let companion = channels.companion();
    let annotations = channels.annotations();

    for p in pulses {
        if p.start_row > p.end_row {
            return Err(ReportError::EmptyInterval {
                index: p.index,
                start_row: p.start_row,
                end_row: p.end_row,
            });
        }
        if p.end_row >= current.len() {
            return Err(ReportError::IntervalOutOfBounds {
                index: p.index,
                end_row: p.end_row,
                len: current.len(),
            });
        }
    }

    let summary_count = config
        .summary_limit
        .map_or(pulses.len(), |limit| limit.min(pulses.len()));
    if summary_count < pulses.len() {
        tracing::info!(
            "Summary limited to {} of {} pulses",
            summary_count,
            pulses.len()
        );
    }

    let raw_header_row = SUMMARY_HEADER_ROW + 1 + summary_count + config.spacer_rows;
    let offset = RowOffset::new(raw_header_row + 1);
    let columns = RawColumns::new(annotations.len(), companion.is_some());

    let mut headers = vec![config.time_label.clone()];
    headers.extend(annotations.iter().map(|a| a.name.clone()));
    if companion.is_some() {
        headers.push(config.companion_label.clone());
    }
    headers.push(config.current_label.clone());
    headers.extend(["Pulse #", "Value", "Desc"].map(String::from));

    // Label rows; pulses are sorted and disjoint so one cursor is enough.
    let mut cursor = pulses.iter().peekable();
    let mut rows = Vec::with_capacity(current.len());
    for (input_row, sample) in current.samples.iter().enumerate() {
        while cursor.peek().is_some_and(|p| p.end_row < input_row) {
            cursor.next();
        }
        let pulse = cursor
            .peek()
            .filter(|p| p.contains(input_row))
            .map(|p| p.index);
        rows.push(RawRow {
            input_row,
            output_row: offset.to_output_row(input_row),
            time: sample.time,
            annotations: annotations
                .iter()
                .map(|a| a.values.get(input_row).cloned().unwrap_or_default())
                .collect(),
            companion: companion.and_then(|c| c.value(input_row)),
            current: sample.value,
            pulse,
            formula: None,
            description: None,
        });
    }

    let mut table = FormulaLocationTable::default();
    for p in pulses {
        let first = offset.to_output_row(p.start_row);
        let last = offset.to_output_row(p.end_row);
        let current_range = CellRange::column_span(Region::RawData, columns.current, first, last);
        let companion_range = columns
            .companion
            .map(|col| CellRange::column_span(Region::RawData, col, first, last));

        // First blank row of the pulse gets the next statistic.
        let mut next_slot = p.start_row;
        for statistic in Statistic::ALL {
            let Some(formula) = Formula::for_statistic(statistic, current_range, companion_range)
            else {
                continue;
            };
            while next_slot <= p.end_row && rows[next_slot].formula.is_some() {
                next_slot += 1;
            }
            if next_slot > p.end_row {
                tracing::info!(
                    "Pulse {} spans {} rows; '{}' has no row to attach to",
                    p.index,
                    p.row_count(),
                    statistic
                );
                continue;
            }
            let slot = next_slot;
            let addr = CellAddress::new(Region::RawData, offset.to_output_row(slot), columns.value);
            rows[slot].formula = Some(formula);
            rows[slot].description = Some(statistic);
            table.insert(p.index, statistic, addr);
        }
    }

    let mut summary = SummaryBlock {
        header_row: SUMMARY_HEADER_ROW,
        first_column: SUMMARY_FIRST_COLUMN,
        headers: SummaryBlock::headers(),
        rows: Vec::with_capacity(summary_count),
    };
    for (i, p) in pulses.iter().take(summary_count).enumerate() {
        let pulse_stats = stats.iter().find(|s| s.index == p.index);
        let mut cells = vec![SummaryCell::Number(p.index as f64)];
        for statistic in Statistic::ALL {
            cells.push(match table.get(p.index, statistic) {
                Some(addr) => SummaryCell::Formula(Formula::Reference(addr)),
                None => SummaryCell::Blank,
            });
        }
        cells.push(pulse_stats.map_or(SummaryCell::Blank, |s| SummaryCell::Number(s.peak_time)));
        cells.push(pulse_stats.map_or(SummaryCell::Blank, |s| SummaryCell::Number(s.duration)));
        summary.rows.push(SummaryRow {
            output_row: SUMMARY_HEADER_ROW + 1 + i,
            pulse_index: p.index,
            cells,
        });
    }

    let report = ReportLayout {
        sheet_name: config.sheet_name.clone(),
        row_offset: offset,
        formula_locations: table,
        summary,
        raw_data: RawDataBlock {
            header_row: raw_header_row,
            headers,
            columns,
            offset,
            rows,
        },
    };
    report.verify()?;
    Ok(report)
}
