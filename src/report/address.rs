//! Logical cell coordinates for the report sheet.
//!
//! Rows and columns are 0-based everywhere inside the crate. Only the A1 rendering
//! (`a1`, `sheet_ref`) switches to the 1-based form a spreadsheet shows.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Region {
    Summary,
    RawData,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CellAddress {
    pub region: Region,
    /// Output-document row.
    pub row: usize,
    pub column: usize,
}

impl CellAddress {
    pub fn new(region: Region, row: usize, column: usize) -> Self {
        Self {
            region,
            row,
            column,
        }
    }

    /// Relative A1 form, e.g. `G12`.
    pub fn a1(&self) -> String {
        format!("{}{}", column_letters(self.column), self.row + 1)
    }
}

impl fmt::Display for CellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.a1())
    }
}

/// A vertical, single-column span of cells, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellRange {
    pub region: Region,
    pub column: usize,
    pub first_row: usize,
    pub last_row: usize,
}

impl CellRange {
    pub fn column_span(region: Region, column: usize, first_row: usize, last_row: usize) -> Self {
        Self {
            region,
            column,
            first_row,
            last_row,
        }
    }

    pub fn contains(&self, addr: &CellAddress) -> bool {
        addr.region == self.region
            && addr.column == self.column
            && addr.row >= self.first_row
            && addr.row <= self.last_row
    }

    pub fn len(&self) -> usize {
        self.last_row + 1 - self.first_row
    }

    /// Relative A1 form, e.g. `E10:E12`.
    pub fn a1(&self) -> String {
        let col = column_letters(self.column);
        format!("{col}{}:{col}{}", self.first_row + 1, self.last_row + 1)
    }

    /// Absolute, sheet-qualified form used by chart series, e.g. `'Sheet1'!$A$10:$A$15`.
    pub fn sheet_ref(&self, sheet: &str) -> String {
        let col = column_letters(self.column);
        format!(
            "'{}'!${col}${}:${col}${}",
            sheet.replace('\'', "''"),
            self.first_row + 1,
            self.last_row + 1
        )
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.a1())
    }
}

/// Shift between input-series rows and output-document rows. The only place that
/// arithmetic happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowOffset {
    first_data_row: usize,
}

impl RowOffset {
    pub fn new(first_data_row: usize) -> Self {
        Self { first_data_row }
    }

    pub fn first_data_row(&self) -> usize {
        self.first_data_row
    }

    pub fn to_output_row(&self, input_row: usize) -> usize {
        input_row + self.first_data_row
    }

    /// `None` for rows above the raw-data block.
    pub fn to_input_row(&self, output_row: usize) -> Option<usize> {
        output_row.checked_sub(self.first_data_row)
    }
}

/// `0 -> A`, `25 -> Z`, `26 -> AA`.
pub fn column_letters(column: usize) -> String {
    let mut n = column + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}
