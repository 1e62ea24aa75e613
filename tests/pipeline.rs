//! End-to-end checks: channels in, report structure out.

use std::io::Write;

use pulsereport::config::AnalyzerConfig;
use pulsereport::error::ReportError;
use pulsereport::report::formula::{Formula, Statistic};
use pulsereport::report::grid;
use pulsereport::report::layout::SummaryCell;
use pulsereport::state::channel::{Channel, ChannelRole, ChannelSet};
use pulsereport::{analyze_file, generate_report};

fn channel_set(time: &[f64], current: &[f64], volts: Option<&[f64]>) -> ChannelSet {
    let mut set = ChannelSet::new();
    set.push_channel(Channel::new(
        "Amp".to_string(),
        "A".to_string(),
        ChannelRole::Current,
        time,
        current,
    ))
    .unwrap();
    if let Some(v) = volts {
        set.push_channel(Channel::new(
            "Volt".to_string(),
            "V".to_string(),
            ChannelRole::Companion,
            time,
            v,
        ))
        .unwrap();
    }
    set
}

/// Baseline ~5 with `n` rectangular pulses of `width` samples, `gap` samples apart.
fn pulse_train(n: usize, width: usize, gap: usize) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
    let mut current = vec![5.0; gap];
    for k in 0..n {
        current.extend(std::iter::repeat(100.0 + 50.0 * k as f64).take(width));
        current.extend(std::iter::repeat(5.0).take(gap));
    }
    let time = (0..current.len()).map(|i| i as f64 * 0.001).collect();
    let volts = current.iter().map(|i| 12.0 - i * 0.01).collect();
    (time, current, volts)
}

#[test]
fn single_pulse_scenario() {
    let time = [0.0, 0.1, 0.2, 0.3, 0.4, 0.5];
    let current = [5.0, 5.0, 60.0, 55.0, 15.0, 5.0];
    let set = channel_set(&time, &current, None);

    let report = generate_report(&set, &AnalyzerConfig::default()).unwrap();

    assert_eq!(report.analysis.total_pulses, 1);
    let stats = &report.analysis.pulses[0];
    assert_eq!(stats.peak_value, 60.0);
    assert_eq!(stats.peak_time, 0.2);
    assert!((stats.duration - 0.1).abs() < 1e-9);

    let labelled: Vec<usize> = report
        .layout
        .raw_data
        .rows
        .iter()
        .filter(|r| r.pulse == Some(1))
        .map(|r| r.input_row)
        .collect();
    assert_eq!(labelled, vec![2, 3]);
}

#[test]
fn first_sample_high_does_not_start_pulse() {
    let time = [0.0, 0.1, 0.2];
    let set = channel_set(&time, &[500.0, 500.0, 500.0], None);
    let report = generate_report(&set, &AnalyzerConfig::default()).unwrap();
    assert_eq!(report.analysis.total_pulses, 0);
}

#[test]
fn series_ending_mid_pulse_closes_at_last_row() {
    let time = [0.0, 0.1, 0.2, 0.3];
    let set = channel_set(&time, &[5.0, 5.0, 80.0, 90.0], None);
    let report = generate_report(&set, &AnalyzerConfig::default()).unwrap();
    assert_eq!(report.analysis.total_pulses, 1);
    assert_eq!(report.analysis.pulses[0].end_time, 0.3);
}

#[test]
fn no_pulses_still_binds_chart() {
    let time = [0.0, 0.1, 0.2];
    let set = channel_set(&time, &[1.0, 2.0, 3.0], Some(&[12.0, 12.0, 12.0]));
    let report = generate_report(&set, &AnalyzerConfig::default()).unwrap();

    assert!(report.layout.summary.rows.is_empty());
    assert_eq!(report.chart.series.len(), 2);
    let first = report.layout.row_offset.first_data_row();
    assert_eq!(report.chart.series[0].values.first_row, first);
    assert_eq!(report.chart.series[0].values.last_row, first + 2);
}

#[test]
fn empty_series_fails_chart_binding() {
    let set = channel_set(&[], &[], None);
    let err = generate_report(&set, &AnalyzerConfig::default()).unwrap_err();
    assert!(matches!(err, ReportError::EmptyDataset));
}

#[test]
fn missing_current_aborts() {
    let mut set = ChannelSet::new();
    set.push_channel(Channel::new(
        "Volt".to_string(),
        "V".to_string(),
        ChannelRole::Companion,
        &[0.0],
        &[12.0],
    ))
    .unwrap();
    let err = generate_report(&set, &AnalyzerConfig::default()).unwrap_err();
    assert!(matches!(err, ReportError::MissingChannel { .. }));
}

#[test]
fn summary_limit_truncates_summary_only() {
    let (time, current, volts) = pulse_train(5, 20, 30);
    let set = channel_set(&time, &current, Some(&volts));
    let mut config = AnalyzerConfig::default();
    config.layout.summary_limit = Some(3);

    let report = generate_report(&set, &config).unwrap();

    assert_eq!(report.analysis.total_pulses, 5);
    assert_eq!(report.layout.summary.rows.len(), 3);
    let max_label = report
        .layout
        .raw_data
        .rows
        .iter()
        .filter_map(|r| r.pulse)
        .max();
    assert_eq!(max_label, Some(5));
    // Every pulse still carries its three formulas.
    assert_eq!(report.layout.formula_locations.len(), 15);
}

#[test]
fn max_pulses_halts_segmentation() {
    let (time, current, _) = pulse_train(5, 10, 10);
    let set = channel_set(&time, &current, None);
    let mut config = AnalyzerConfig::default();
    config.pulse.max_pulses = Some(3);

    let report = generate_report(&set, &config).unwrap();
    assert_eq!(report.analysis.total_pulses, 3);
    assert!(report.layout.summary.rows.len() <= 3);
}

#[test]
fn summary_references_resolve_to_raw_formulas() {
    let (time, current, volts) = pulse_train(3, 12, 15);
    let set = channel_set(&time, &current, Some(&volts));
    let report = generate_report(&set, &AnalyzerConfig::default()).unwrap();
    let layout = &report.layout;

    for row in &layout.summary.rows {
        for statistic in Statistic::ALL {
            let col = layout.summary.statistic_column(statistic) - layout.summary.first_column;
            let SummaryCell::Formula(Formula::Reference(target)) = &row.cells[col] else {
                panic!("pulse {} {} is not a reference", row.pulse_index, statistic);
            };
            let raw = layout.raw_data.formula_at(target).expect("dangling reference");
            assert!(!raw.reads(target));
            let source_row = layout.raw_data.row_at(target.row).unwrap();
            assert_eq!(source_row.pulse, Some(row.pulse_index));
            assert_eq!(source_row.description, Some(statistic));
        }
    }

    // Pulse 1's peak range covers exactly its rows, shifted by the row offset.
    let peak = layout.formula_locations.get(1, Statistic::PeakCurrent).unwrap();
    let Some(Formula::Aggregate(agg)) = layout.raw_data.formula_at(&peak) else {
        panic!("peak is not an aggregate");
    };
    let offset = layout.row_offset;
    assert_eq!(offset.to_input_row(agg.range.first_row), Some(15));
    assert_eq!(offset.to_input_row(agg.range.last_row), Some(26));
}

#[test]
fn identical_input_gives_identical_report() {
    let (time, current, volts) = pulse_train(4, 8, 9);
    let set = channel_set(&time, &current, Some(&volts));
    let a = generate_report(&set, &AnalyzerConfig::default()).unwrap();
    let b = generate_report(&set, &AnalyzerConfig::default()).unwrap();
    assert_eq!(a.to_json().unwrap(), b.to_json().unwrap());
}

#[test]
fn csv_file_round_trip_through_cli_pipeline() {
    let mut input = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    writeln!(input, "Relative Time,Date,Time Stamp UTC,Volt ,Amp ,Chn 1 Events").unwrap();
    let current = [5.0, 5.0, 60.0, 70.0, 65.0, 15.0, 5.0];
    for (i, amp) in current.iter().enumerate() {
        writeln!(
            input,
            "{},01/01/2024,12:00:0{} PM,12.0,{},0",
            i as f64 * 0.1,
            i,
            amp
        )
        .unwrap();
    }
    input.flush().unwrap();

    let report = analyze_file(input.path(), &AnalyzerConfig::default()).unwrap();
    assert_eq!(report.analysis.total_pulses, 1);
    assert_eq!(
        report.layout.raw_data.headers,
        vec![
            "Relative Time",
            "Date",
            "Time Stamp UTC",
            "Clamp [V]",
            "Current [A]",
            "Pulse #",
            "Value",
            "Desc"
        ]
    );

    let sheet = grid::render(&report.layout);
    let out = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    grid::save_csv(&sheet, out.path()).unwrap();
    let text = std::fs::read_to_string(out.path()).unwrap();
    // One pulse: raw header at row 6, data from row 7 (A1 row 8). Pulse rows 2..=4 -> 10..=12.
    assert!(text.contains("=MIN(D10:D12)"));
    assert!(text.contains("=MAX(E10:E12)"));
    assert!(text.contains("=AVERAGE(D10:D12)*AVERAGE(E10:E12)*COUNT(E10:E12)/100"));
    assert!(text.contains("=G10"));
}
