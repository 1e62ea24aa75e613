use serde::{Deserialize, Serialize};

use crate::error::{ReportError, Result};
use crate::report::address::CellRange;
use crate::report::layout::RawDataBlock;
use crate::state::channel::ChannelRole;

/// Fallback series colors, cycled by series position.
pub const COLOR_PALETTE: [[u8; 4]; 6] = [
    [31, 78, 121, 255], // Dark Blue
    [255, 140, 0, 255], // Orange
    [0, 128, 0, 255],   // Dark Green
    [128, 0, 128, 255], // Purple
    [165, 42, 42, 255], // Brown
    [0, 0, 128, 255],   // Navy
];

pub fn color_for_index(index: usize) -> [u8; 4] {
    COLOR_PALETTE[index % COLOR_PALETTE.len()]
}

/// `#rrggbb`, alpha dropped.
pub fn hex_color(color: [u8; 4]) -> String {
    format!("#{:02x}{:02x}{:02x}", color[0], color[1], color[2])
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LineStyle {
    pub color: [u8; 4],
    pub width: f32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LegendPosition {
    Top,
    #[default]
    Bottom,
    Left,
    Right,
    None,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisSpec {
    pub title: String,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl AxisSpec {
    pub fn titled(title: &str) -> Self {
        Self {
            title: title.to_string(),
            min: None,
            max: None,
        }
    }

    pub fn bounded(title: &str, min: f64, max: f64) -> Self {
        Self {
            title: title.to_string(),
            min: Some(min),
            max: Some(max),
        }
    }
}

/// Which raw-data column a series plots, and how.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesSpec {
    pub channel: ChannelRole,
    /// Defaults to the raw-data column header.
    pub label: Option<String>,
    pub line: Option<LineStyle>,
    #[serde(default)]
    pub secondary_axis: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    pub title: String,
    pub x_axis: AxisSpec,
    pub y_axis: AxisSpec,
    pub y2_axis: Option<AxisSpec>,
    pub legend: LegendPosition,
    pub series: Vec<SeriesSpec>,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            title: "Clamp Voltage and Current vs Time".to_string(),
            x_axis: AxisSpec::titled("Relative Time (seconds)"),
            y_axis: AxisSpec::bounded("Clamp [V]", 0.0, 25.0),
            y2_axis: Some(AxisSpec::bounded("Current [A]", 0.0, 450.0)),
            legend: LegendPosition::Bottom,
            series: vec![
                SeriesSpec {
                    channel: ChannelRole::Companion,
                    label: None,
                    line: Some(LineStyle {
                        color: [31, 78, 121, 255],
                        width: 2.0,
                    }),
                    secondary_axis: false,
                },
                SeriesSpec {
                    channel: ChannelRole::Current,
                    label: None,
                    line: Some(LineStyle {
                        color: [255, 140, 0, 255],
                        width: 2.0,
                    }),
                    secondary_axis: true,
                },
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    pub name: String,
    pub categories: CellRange,
    pub values: CellRange,
    pub line: LineStyle,
    pub secondary_axis: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    pub sheet_name: String,
    pub title: String,
    pub x_axis: AxisSpec,
    pub y_axis: AxisSpec,
    pub y2_axis: Option<AxisSpec>,
    pub legend: LegendPosition,
    pub series: Vec<ChartSeries>,
}

/// Bind `config.series` to the raw-data block. Every series shares one row window.
pub fn build_chart(
    raw: &RawDataBlock,
    sheet_name: &str,
    config: &ChartConfig,
) -> Result<ChartSpec> {
    let categories = raw
        .column_range(raw.columns.time)
        .ok_or(ReportError::EmptyDataset)?;

    let mut series = Vec::with_capacity(config.series.len());
    for (i, spec) in config.series.iter().enumerate() {
        let Some(column) = raw.columns.for_role(spec.channel) else {
            tracing::info!("Skipping chart series for absent {} channel", spec.channel);
            continue;
        };
        let values = CellRange {
            column,
            ..categories
        };
        let name = spec
            .label
            .clone()
            .or_else(|| raw.headers.get(column).cloned())
            .unwrap_or_else(|| spec.channel.to_string());
        series.push(ChartSeries {
            name,
            categories,
            values,
            line: spec.line.unwrap_or(LineStyle {
                color: color_for_index(i),
                width: 2.0,
            }),
            secondary_axis: spec.secondary_axis,
        });
    }

    let uses_primary = series.iter().any(|s| !s.secondary_axis);
    let uses_secondary = series.iter().any(|s| s.secondary_axis);
    let (y_axis, y2_axis) = if uses_primary || !uses_secondary {
        (
            config.y_axis.clone(),
            config.y2_axis.clone().filter(|_| uses_secondary),
        )
    } else {
        // Nothing plots on the primary axis: the secondary axis takes its place.
        tracing::info!("No series on the primary axis; moving secondary series onto it");
        for s in &mut series {
            s.secondary_axis = false;
        }
        let axis = config
            .y2_axis
            .clone()
            .unwrap_or_else(|| AxisSpec::titled(&series[0].name));
        (axis, None)
    };

    Ok(ChartSpec {
        sheet_name: sheet_name.to_string(),
        title: config.title.clone(),
        x_axis: config.x_axis.clone(),
        y_axis,
        y2_axis,
        legend: config.legend,
        series,
    })
}
