use std::collections::{HashMap, HashSet};

/// How many leading rows are considered when looking for the header.
pub const HEADER_SCAN_ROWS: usize = 50;

/// Detect the header row index among the first `HEADER_SCAN_ROWS` rows.
///
/// Instrument exports often put a preamble above the column names, so the header is the
/// *last* all-text row that fills the dominant column count. Falls back to row 0.
pub fn detect_header_row(rows: &[Vec<String>]) -> usize {
    let scanned = &rows[..rows.len().min(HEADER_SCAN_ROWS)];
    if scanned.is_empty() {
        return 0;
    }

    let filled = |row: &Vec<String>| row.iter().filter(|c| !c.trim().is_empty()).count();

    // Most common count of filled cells per row
    let mut counts: HashMap<usize, usize> = HashMap::new();
    for row in scanned {
        let n = filled(row);
        if n > 0 {
            *counts.entry(n).or_insert(0) += 1;
        }
    }
    let dominant = counts
        .into_iter()
        .max_by_key(|&(len, c)| (c, len))
        .map(|(len, _)| len)
        .unwrap_or(0);

    // Columns that carry anything at all
    let used_cols: HashSet<usize> = scanned
        .iter()
        .flat_map(|row| {
            row.iter()
                .enumerate()
                .filter(|(_, c)| !c.trim().is_empty())
                .map(|(i, _)| i)
        })
        .collect();
    let required = dominant.min(used_cols.len()).max(1);

    for i in (0..scanned.len()).rev() {
        let row = &scanned[i];
        if filled(row) < required {
            continue;
        }
        let all_text = row
            .iter()
            .map(|c| c.trim())
            .filter(|c| !c.is_empty())
            .all(|c| c.parse::<f64>().is_err() && !is_date_like(c));
        if all_text {
            return i;
        }
    }

    0
}

/// Parse a numeric cell, tolerating surrounding whitespace. Blank or text cells are NaN.
pub fn parse_number(cell: &str) -> f64 {
    cell.trim().parse::<f64>().unwrap_or(f64::NAN)
}

pub fn is_date_like(s: &str) -> bool {
    let lower = s.to_lowercase();
    let has_separators = s.contains('/') || s.contains(':');
    let has_date_words = lower.contains("am") || lower.contains("pm");

    if !has_separators && !has_date_words {
        return false;
    }

    use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
    let formats = [
        "%Y-%m-%d %H:%M:%S",
        "%m/%d/%Y %H:%M:%S",
        "%d/%m/%Y %H:%M:%S",
        "%Y-%m-%d",
        "%m/%d/%Y",
    ];
    for fmt in &formats {
        if NaiveDateTime::parse_from_str(s, fmt).is_ok()
            || NaiveDate::parse_from_str(s, fmt).is_ok()
        {
            return true;
        }
    }
    // Bare clock times like "12:00:00 PM"
    ["%I:%M:%S %p", "%H:%M:%S", "%H:%M:%S%.f"]
        .iter()
        .any(|fmt| NaiveTime::parse_from_str(s, fmt).is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(data: &[&[&str]]) -> Vec<Vec<String>> {
        data.iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    #[test]
    fn header_below_preamble() {
        let data = rows(&[
            &["Logger export", "", ""],
            &["Serial", "1234", ""],
            &["Relative Time", "Volt ", "Amp "],
            &["0", "12.1", "5"],
            &["0.001", "12.0", "6"],
            &["0.002", "12.2", "5"],
        ]);
        assert_eq!(detect_header_row(&data), 2);
    }

    #[test]
    fn dates_and_clock_times_are_not_headers() {
        let data = rows(&[
            &["Date", "Time Stamp UTC", "Amp "],
            &["01/01/2024", "12:00:00 PM", "5"],
            &["01/01/2024", "12:00:01 PM", "Error"],
        ]);
        assert_eq!(detect_header_row(&data), 0);
        assert!(is_date_like("01/01/2024"));
        assert!(is_date_like("12:00:00 PM"));
        assert!(!is_date_like("Amp "));
    }

    #[test]
    fn parse_number_defaults_to_nan() {
        assert_eq!(parse_number(" 4.5 "), 4.5);
        assert!(parse_number("").is_nan());
        assert!(parse_number("n/a").is_nan());
    }
}
