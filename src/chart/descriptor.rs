//! Renderer-agnostic chart descriptors.
//!
//! A descriptor is plain data: category axis, value series, axis/legend flags.
//! Gaps stay `None` in `values`; renderers must skip them, never draw them as zero.

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Round-robin palette for multi-series charts.
pub const PALETTE: [&str; 15] = [
    "#3b82f6", "#10b981", "#f59e0b", "#ef4444", "#8b5cf6", "#ec4899", "#14b8a6", "#f97316", "#06b6d4",
    "#84cc16", "#6366f1", "#f43f5e", "#a3e635", "#fb923c", "#c084fc",
];

pub const DEFAULT_COLOR: &str = PALETTE[0];

pub fn palette_color(idx: usize) -> &'static str {
    PALETTE[idx % PALETTE.len()]
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    #[default]
    Line,
    Bar,
    StackedBar,
    Pie,
}

impl ChartKind {
    pub const ALL: [ChartKind; 4] = [ChartKind::Line, ChartKind::Bar, ChartKind::StackedBar, ChartKind::Pie];

    pub fn display_name(self) -> &'static str {
        match self {
            ChartKind::Line => "Line",
            ChartKind::Bar => "Bar",
            ChartKind::StackedBar => "Stacked bar",
            ChartKind::Pie => "Pie",
        }
    }

    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|&k| k == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

/// How time categories are printed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum LabelStyle {
    /// Time of day for windows of at most 24h, full date-time otherwise.
    #[default]
    Auto,
    /// `YYYY-MM-DD HH:MM`
    DateTime,
    /// `HH:MM`
    TimeOfDay,
}

impl LabelStyle {
    pub fn format(self, instant: DateTime<Utc>) -> String {
        match self {
            LabelStyle::TimeOfDay => instant.format("%H:%M").to_string(),
            LabelStyle::Auto | LabelStyle::DateTime => instant.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Instant(DateTime<Utc>),
    Label(String),
}

impl Category {
    pub fn display(&self, style: LabelStyle) -> String {
        match self {
            Category::Instant(t) => style.format(*t),
            Category::Label(s) => s.clone(),
        }
    }

    pub fn instant(&self) -> Option<DateTime<Utc>> {
        match self {
            Category::Instant(t) => Some(*t),
            Category::Label(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DescriptorSeries {
    pub label: String,
    pub unit: String,
    /// One entry per category; `None` is a gap.
    pub values: Vec<Option<f64>>,
    pub color: String,
    #[serde(default)]
    pub fill: bool,
}

impl DescriptorSeries {
    pub fn present_values(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.iter().filter_map(|v| *v)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisConfig {
    pub show_grid: bool,
    pub stacked: bool,
    /// Value-axis title; `None` when series carry different units.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_title: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegendPosition {
    #[default]
    Top,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegendConfig {
    pub show: bool,
    pub position: LegendPosition,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartDescriptor {
    pub kind: ChartKind,
    pub categories: Vec<Category>,
    pub series: Vec<DescriptorSeries>,
    /// Absent for pie charts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub axes: Option<AxisConfig>,
    pub legend: LegendConfig,
    pub label_style: LabelStyle,
}

impl ChartDescriptor {
    pub fn category_labels(&self) -> Vec<String> {
        self.categories.iter().map(|c| c.display(self.label_style)).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.series.iter().all(|s| s.present_values().next().is_none())
    }

    pub fn is_stacked(&self) -> bool {
        self.axes.as_ref().is_some_and(|a| a.stacked)
    }
}

/// Presentation options for [`crate::chart::build`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartOptions {
    pub kind: ChartKind,
    pub show_grid: bool,
    pub show_legend: bool,
    /// Per-series colour overrides by index; blanks fall back to the palette.
    pub colors: Vec<String>,
    /// Per-series label overrides by index (comparison mode).
    pub labels: Vec<String>,
    pub stacked: bool,
    /// Area rendering for line charts.
    pub fill: bool,
    pub label_style: LabelStyle,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            kind: ChartKind::Line,
            show_grid: true,
            show_legend: true,
            colors: Vec::new(),
            labels: Vec::new(),
            stacked: false,
            fill: false,
            label_style: LabelStyle::Auto,
        }
    }
}

impl ChartOptions {
    pub fn with_kind(kind: ChartKind) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }

    pub fn color_for(&self, idx: usize) -> String {
        match self.colors.get(idx).map(|c| c.trim()) {
            Some(c) if !c.is_empty() => c.to_string(),
            _ => palette_color(idx).to_string(),
        }
    }

    pub fn label_for(&self, idx: usize) -> Option<&str> {
        self.labels
            .get(idx)
            .map(|l| l.trim())
            .filter(|l| !l.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn label_styles() {
        let t = Utc.with_ymd_and_hms(2024, 1, 2, 9, 5, 0).unwrap();
        assert_eq!(LabelStyle::DateTime.format(t), "2024-01-02 09:05");
        assert_eq!(LabelStyle::TimeOfDay.format(t), "09:05");
        assert_eq!(Category::Label("Solar".into()).display(LabelStyle::TimeOfDay), "Solar");
    }

    #[test]
    fn color_overrides_fall_back_to_palette() {
        let opts = ChartOptions {
            colors: vec!["#000000".into(), " ".into()],
            ..ChartOptions::default()
        };
        assert_eq!(opts.color_for(0), "#000000");
        assert_eq!(opts.color_for(1), PALETTE[1]);
        assert_eq!(opts.color_for(16), PALETTE[1]);
        assert_eq!(DEFAULT_COLOR, "#3b82f6");
    }

    #[test]
    fn descriptor_json_round_trips() {
        let d = ChartDescriptor {
            kind: ChartKind::Line,
            categories: vec![
                Category::Instant(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
                Category::Instant(Utc.with_ymd_and_hms(2024, 1, 1, 1, 0, 0).unwrap()),
            ],
            series: vec![DescriptorSeries {
                label: "Actual Load (MW)".into(),
                unit: "MW".into(),
                values: vec![Some(1.0), None],
                color: DEFAULT_COLOR.into(),
                fill: false,
            }],
            axes: Some(AxisConfig {
                show_grid: true,
                stacked: false,
                y_title: Some("MW".into()),
            }),
            legend: LegendConfig {
                show: true,
                position: LegendPosition::Top,
            },
            label_style: LabelStyle::TimeOfDay,
        };
        let json = serde_json::to_string(&d).unwrap();
        assert!(json.contains("null"));
        let back: ChartDescriptor = serde_json::from_str(&json).unwrap();
        assert_eq!(back, d);
        assert_eq!(back.category_labels(), vec!["00:00", "01:00"]);
    }
}
