//! Turn loaded tabular columns into a [`ChannelSet`].

use crate::config::ChannelConfig;
use crate::data::datetime;
use crate::data::loader::LoadedData;
use crate::data::parser::parse_number;
use crate::data::unit_inference::{infer_role, infer_unit, is_time_column};
use crate::error::{ReportError, Result};
use crate::state::channel::{Channel, ChannelRole, ChannelSet, TextColumn};

fn find_column(
    data: &LoadedData,
    explicit: Option<&str>,
    taken: &[usize],
    inferred: impl Fn(&str) -> bool,
) -> Option<usize> {
    match explicit {
        Some(name) => data.column_index(name),
        None => data
            .columns
            .iter()
            .enumerate()
            .find(|(i, name)| !taken.contains(i) && inferred(name.as_str()))
            .map(|(i, _)| i),
    }
}

/// Numeric seconds if the column parses as numbers, else timestamps relative to the first row.
fn time_base(values: &[String]) -> Option<Vec<f64>> {
    let filled: Vec<&String> = values.iter().filter(|v| !v.trim().is_empty()).collect();
    if filled.is_empty() {
        return None;
    }
    let numeric = filled.iter().filter(|v| v.trim().parse::<f64>().is_ok()).count();
    if numeric * 10 >= filled.len() * 9 {
        return Some(values.iter().map(|v| parse_number(v)).collect());
    }
    datetime::relative_seconds(values)
}

pub fn build_channel_set(mut data: LoadedData, config: &ChannelConfig) -> Result<ChannelSet> {
    for name in &config.drop_columns {
        if data.drop_column(name) {
            tracing::info!("Removed '{}' column", name.trim());
        }
    }

    let current_idx = find_column(&data, config.current_column.as_deref(), &[], |n| {
        infer_role(n) == Some(ChannelRole::Current)
    })
    .ok_or(ReportError::MissingChannel {
        role: ChannelRole::Current,
    })?;

    let companion_idx = find_column(&data, config.companion_column.as_deref(), &[current_idx], |n| {
        infer_role(n) == Some(ChannelRole::Companion)
    });
    if companion_idx.is_none() {
        if config.companion_column.is_some() {
            return Err(ReportError::MissingChannel {
                role: ChannelRole::Companion,
            });
        }
        tracing::info!("No companion voltage column; voltage statistics will be left blank");
    }

    let mut taken = vec![current_idx];
    taken.extend(companion_idx);
    let time_idx = find_column(&data, config.time_column.as_deref(), &taken, is_time_column);
    taken.extend(time_idx);

    let time = match time_idx.and_then(|i| time_base(&data.column_data[i])) {
        Some(t) => t,
        None => {
            tracing::warn!("No usable time column; using row index as time");
            (0..data.row_count).map(|i| i as f64).collect()
        }
    };

    let mut set = ChannelSet::new();
    let mut push = |idx: usize, role: ChannelRole| -> Result<()> {
        let name = data.columns[idx].clone();
        let values: Vec<f64> = data.column_data[idx].iter().map(|v| parse_number(v)).collect();
        tracing::info!("Using '{}' as {} channel", name, role);
        set.push_channel(Channel::new(name.clone(), infer_unit(&name), role, &time, &values))
    };
    push(current_idx, ChannelRole::Current)?;
    if let Some(idx) = companion_idx {
        push(idx, ChannelRole::Companion)?;
    }

    for (i, name) in data.columns.iter().enumerate() {
        if taken.contains(&i) {
            continue;
        }
        set.push_annotation(TextColumn {
            name: name.clone(),
            values: data.column_data[i].clone(),
        })?;
    }

    Ok(set)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loaded(columns: &[&str], rows: &[&[&str]]) -> LoadedData {
        let mut column_data = vec![Vec::new(); columns.len()];
        for row in rows {
            for (c, cell) in row.iter().enumerate() {
                column_data[c].push(cell.to_string());
            }
        }
        LoadedData {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            column_data,
            row_count: rows.len(),
        }
    }

    #[test]
    fn classic_export_columns() {
        let data = loaded(
            &["Relative Time", "Date", "Time Stamp UTC", "Volt", "Amp", "Chn 1 Events"],
            &[
                &["0", "01/01/2024", "12:00:00 PM", "12.1", "5", "0"],
                &["0.1", "01/01/2024", "12:00:00 PM", "11.8", "60", "0"],
            ],
        );
        let set = build_channel_set(data, &ChannelConfig::default()).unwrap();

        let current = set.current().unwrap();
        assert_eq!(current.name, "Amp");
        assert_eq!(current.unit, "A");
        assert_eq!(current.samples[1].time, 0.1);
        assert_eq!(current.samples[1].value, 60.0);
        assert_eq!(set.companion().unwrap().value(1), Some(11.8));

        let names: Vec<&str> = set.annotations().iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["Date", "Time Stamp UTC"]);
    }

    #[test]
    fn missing_current_column_is_fatal() {
        let data = loaded(&["Time", "Volt"], &[&["0", "1"]]);
        let err = build_channel_set(data, &ChannelConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            ReportError::MissingChannel {
                role: ChannelRole::Current
            }
        ));
    }

    #[test]
    fn explicit_column_names_win() {
        let data = loaded(&["t", "I1", "I2"], &[&["0", "1", "2"], &["1", "3", "4"]]);
        let config = ChannelConfig {
            time_column: Some("t".to_string()),
            current_column: Some("I2".to_string()),
            ..ChannelConfig::default()
        };
        let set = build_channel_set(data, &config).unwrap();
        assert_eq!(set.current().unwrap().value(1), Some(4.0));
        assert_eq!(set.current().unwrap().samples[1].time, 1.0);
        assert!(set.companion().is_none());
        assert_eq!(set.annotations().len(), 1);
    }

    #[test]
    fn timestamp_time_column_becomes_relative() {
        let data = loaded(
            &["Time", "Current"],
            &[
                &["2024-01-01 12:00:00", "1"],
                &["2024-01-01 12:00:02", "2"],
            ],
        );
        let set = build_channel_set(data, &ChannelConfig::default()).unwrap();
        assert_eq!(set.current().unwrap().samples[1].time, 2.0);
    }

    #[test]
    fn no_time_column_falls_back_to_index() {
        let data = loaded(&["Amp"], &[&["1"], &["2"], &["3"]]);
        let set = build_channel_set(data, &ChannelConfig::default()).unwrap();
        assert_eq!(set.current().unwrap().samples[2].time, 2.0);
    }
}
