use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Sentinel returned by `detect_date_format` for RFC 3339 timestamps (`2026-02-10T22:26:28.987Z`).
pub const RFC3339_FORMAT: &str = "__rfc3339__";

/// Timestamp formats tried on time columns, most specific first
pub const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %H:%M:%S%.f",
    "%m/%d/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M:%S%.f",
    "%d/%m/%Y %H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
    "%Y-%m-%d",
    "%m/%d/%Y",
];

fn parse_rate(sample: &[&str], parses: impl Fn(&str) -> bool) -> f64 {
    let ok = sample.iter().filter(|&&s| parses(s)).count();
    ok as f64 / sample.len() as f64
}

/// Pick the format that parses the largest share of the first 100 non-empty values.
pub fn detect_date_format(values: &[String]) -> Option<&'static str> {
    let sample: Vec<&str> = values
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .take(100)
        .collect();
    if sample.is_empty() {
        return None;
    }

    let rfc3339 = parse_rate(&sample, |s| DateTime::parse_from_rfc3339(s).is_ok());
    let mut best = (RFC3339_FORMAT, rfc3339);
    for &fmt in DATE_FORMATS {
        let score = parse_rate(&sample, |s| {
            NaiveDateTime::parse_from_str(s, fmt).is_ok()
                || NaiveDate::parse_from_str(s, fmt).is_ok()
        });
        if score > best.1 {
            best = (fmt, score);
        }
    }

    (best.1 > 0.0).then_some(best.0)
}

/// Unix seconds (millisecond precision) for `value` in `format`.
pub fn parse_to_timestamp(value: &str, format: &str) -> Option<f64> {
    if format == RFC3339_FORMAT {
        return DateTime::parse_from_rfc3339(value)
            .ok()
            .map(|dt| dt.timestamp_millis() as f64 / 1000.0);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
        return Some(dt.and_utc().timestamp_millis() as f64 / 1000.0);
    }
    let day = NaiveDate::parse_from_str(value, format).ok()?;
    Some(day.and_hms_opt(0, 0, 0)?.and_utc().timestamp() as f64)
}

/// Convert timestamp strings to seconds relative to the first parseable one.
/// Returns `None` when the column does not look like timestamps at all.
pub fn relative_seconds(values: &[String]) -> Option<Vec<f64>> {
    let format = detect_date_format(values)?;
    let absolute: Vec<f64> = values
        .iter()
        .map(|v| parse_to_timestamp(v.trim(), format).unwrap_or(f64::NAN))
        .collect();
    let origin = absolute.iter().copied().find(|t| t.is_finite())?;
    Some(absolute.into_iter().map(|t| t - origin).collect())
}
