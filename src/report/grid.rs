use std::io;
use std::path::Path;

use serde::Serialize;

use crate::error::Result;
use crate::report::layout::{ReportLayout, SummaryCell};

/// One cell of the flattened sheet, as a document writer would receive it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum GridCell {
    Empty,
    Text(String),
    Number(f64),
    Formula(String),
}

impl GridCell {
    fn number(value: f64) -> Self {
        if value.is_finite() {
            GridCell::Number(value)
        } else {
            GridCell::Empty
        }
    }

    pub fn as_text(&self) -> String {
        match self {
            GridCell::Empty => String::new(),
            GridCell::Text(s) | GridCell::Formula(s) => s.clone(),
            GridCell::Number(v) => format!("{v}"),
        }
    }
}

/// Dense row-major sheet. `cells[row][column]` uses output-document coordinates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Grid {
    pub cells: Vec<Vec<GridCell>>,
}

impl Grid {
    fn new(rows: usize, columns: usize) -> Self {
        Self {
            cells: vec![vec![GridCell::Empty; columns]; rows],
        }
    }

    fn set(&mut self, row: usize, column: usize, cell: GridCell) {
        if let Some(slot) = self.cells.get_mut(row).and_then(|r| r.get_mut(column)) {
            *slot = cell;
        }
    }

    pub fn get(&self, row: usize, column: usize) -> Option<&GridCell> {
        self.cells.get(row).and_then(|r| r.get(column))
    }

    pub fn row_count(&self) -> usize {
        self.cells.len()
    }
}

/// Flatten the layout into one sheet: summary on top, raw data below.
pub fn render(layout: &ReportLayout) -> Grid {
    let summary = &layout.summary;
    let raw = &layout.raw_data;

    let rows = raw.header_row + 1 + raw.row_count();
    let columns = raw
        .columns
        .width()
        .max(summary.first_column + summary.headers.len());
    let mut grid = Grid::new(rows, columns);

    for (i, header) in summary.headers.iter().enumerate() {
        grid.set(summary.header_row, summary.first_column + i, GridCell::Text(header.clone()));
    }
    for row in &summary.rows {
        for (i, cell) in row.cells.iter().enumerate() {
            let cell = match cell {
                SummaryCell::Blank => GridCell::Empty,
                SummaryCell::Number(v) => GridCell::number(*v),
                SummaryCell::Formula(f) => GridCell::Formula(f.render()),
            };
            grid.set(row.output_row, summary.first_column + i, cell);
        }
    }

    for (i, header) in raw.headers.iter().enumerate() {
        grid.set(raw.header_row, i, GridCell::Text(header.clone()));
    }
    let cols = &raw.columns;
    for row in &raw.rows {
        let r = row.output_row;
        grid.set(r, cols.time, GridCell::number(row.time));
        for (col, text) in cols.annotations.iter().zip(&row.annotations) {
            grid.set(r, *col, GridCell::Text(text.clone()));
        }
        if let (Some(col), Some(v)) = (cols.companion, row.companion) {
            grid.set(r, col, GridCell::number(v));
        }
        grid.set(r, cols.current, GridCell::number(row.current));
        if let Some(p) = row.pulse {
            grid.set(r, cols.pulse, GridCell::Number(p as f64));
        }
        if let Some(f) = &row.formula {
            grid.set(r, cols.value, GridCell::Formula(f.render()));
        }
        if let Some(stat) = row.description {
            grid.set(r, cols.description, GridCell::Text(stat.label().to_string()));
        }
    }

    grid
}

/// Write the grid as CSV. Formulas are written as their `=...` text.
pub fn write_csv<W: io::Write>(grid: &Grid, out: W) -> Result<()> {
    let mut writer = csv::WriterBuilder::new().flexible(true).from_writer(out);
    for row in &grid.cells {
        writer.write_record(row.iter().map(|c| c.as_text()))?;
    }
    writer.flush()?;
    Ok(())
}

pub fn save_csv(grid: &Grid, path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)?;
    write_csv(grid, io::BufWriter::new(file))?;
    tracing::info!("Exported report grid to {:?}", path);
    Ok(())
}
