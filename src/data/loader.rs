use std::path::Path;

use crate::data::parser;
use crate::error::{ReportError, Result};

/// Result of loading a data file: column names and column data as strings
#[derive(Debug, Clone)]
pub struct LoadedData {
    pub columns: Vec<String>,
    pub column_data: Vec<Vec<String>>, // column-major: column_data[col_idx][row_idx]
    pub row_count: usize,
}

impl LoadedData {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        let wanted = name.trim();
        self.columns.iter().position(|c| c.trim() == wanted)
    }

    /// Remove a column by (trimmed) name. Returns whether it existed.
    pub fn drop_column(&mut self, name: &str) -> bool {
        match self.column_index(name) {
            Some(idx) => {
                self.columns.remove(idx);
                self.column_data.remove(idx);
                true
            }
            None => false,
        }
    }
}

/// Load a CSV or Excel file and return the column names and raw string data.
pub fn load_file(path: &Path) -> Result<LoadedData> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    let rows = match ext.as_str() {
        "csv" => read_csv_rows(path)?,
        "xls" | "xlsx" | "xlsm" => read_excel_rows(path)?,
        _ => return Err(ReportError::UnsupportedFormat(ext)),
    };

    let data = into_columns(rows)?;
    tracing::info!(
        "Loaded {} rows x {} columns from {:?}",
        data.row_count,
        data.columns.len(),
        path
    );
    Ok(data)
}

fn read_csv_rows(path: &Path) -> Result<Vec<Vec<String>>> {
    let content = std::fs::read(path)?;
    // Try UTF-8 first; fall back to latin1 (each byte maps to the same code point)
    let text = String::from_utf8(content)
        .unwrap_or_else(|e| e.into_bytes().iter().map(|&b| b as char).collect());

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    for (i, result) in reader.records().enumerate() {
        match result {
            Ok(record) => rows.push(record.iter().map(|s| s.to_string()).collect()),
            Err(e) => tracing::warn!("Skipping malformed CSV record {}: {e}", i + 1),
        }
    }
    Ok(rows)
}

fn read_excel_rows(path: &Path) -> Result<Vec<Vec<String>>> {
    use calamine::{open_workbook_auto, Data, Reader};

    let mut workbook = open_workbook_auto(path)
        .map_err(|e| ReportError::Load(format!("cannot open workbook: {e}")))?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| ReportError::Load("workbook has no sheets".to_string()))?;

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| ReportError::Load(format!("cannot read sheet '{sheet_name}': {e}")))?;

    Ok(range
        .rows()
        .map(|row| {
            row.iter()
                .map(|cell| match cell {
                    Data::Empty => String::new(),
                    Data::String(s) => s.clone(),
                    Data::Float(f) => f.to_string(),
                    Data::Int(i) => i.to_string(),
                    Data::Bool(b) => b.to_string(),
                    Data::DateTime(dt) => dt
                        .as_datetime()
                        .map(|d| d.format("%Y-%m-%d %H:%M:%S%.3f").to_string())
                        .unwrap_or_else(|| dt.to_string()),
                    Data::DateTimeIso(s) => s.clone(),
                    Data::DurationIso(s) => s.clone(),
                    Data::Error(e) => format!("{e:?}"),
                })
                .collect()
        })
        .collect())
}

fn into_columns(all_rows: Vec<Vec<String>>) -> Result<LoadedData> {
    let header_row = parser::detect_header_row(&all_rows);
    if all_rows.is_empty() || header_row >= all_rows.len() {
        return Err(ReportError::Load(
            "no data found after header detection".to_string(),
        ));
    }

    let columns: Vec<String> = all_rows[header_row]
        .iter()
        .map(|s| s.trim().to_string())
        .collect();

    let data_rows: Vec<&Vec<String>> = all_rows[header_row + 1..]
        .iter()
        .filter(|row| row.iter().any(|c| !c.trim().is_empty()))
        .collect();

    let mut column_data: Vec<Vec<String>> =
        vec![Vec::with_capacity(data_rows.len()); columns.len()];
    for row in &data_rows {
        for (col_idx, col_data) in column_data.iter_mut().enumerate() {
            col_data.push(row.get(col_idx).cloned().unwrap_or_default());
        }
    }

    Ok(LoadedData {
        columns,
        column_data,
        row_count: data_rows.len(),
    })
}
