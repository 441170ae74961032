//! Command-line parsing for the ENTSO-E market charting tool.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the fetch/parse/chart pipeline.

use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::app::pipeline::DatasetSpec;
use crate::chart::{ChartKind, LabelStyle};
use crate::domain::{DateRange, MetricKind, RangePreset};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "entsoe", version, about = "ENTSO-E Transparency Platform market charts")]
pub struct Cli {
    /// TOML configuration file (API key, base URL, cache TTL, default area).
    #[arg(long, global = true, value_name = "TOML")]
    pub config: Option<PathBuf>,

    /// Log debug details (requests, cache hits, dropped points) to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch one metric for one area, print a summary and plot, and optionally export.
    Fetch(FetchArgs),
    /// Fetch several (metric, area) datasets and chart them on one shared time axis.
    Compare(CompareArgs),
    /// Plot a previously exported descriptor JSON.
    Plot(PlotArgs),
    /// Launch the interactive TUI.
    Tui(TuiArgs),
}

/// Date window options shared by `fetch` and `compare`.
#[derive(Debug, Args, Clone)]
pub struct WindowArgs {
    /// Date range preset.
    #[arg(short = 'r', long, value_enum, default_value_t = RangePreset::Today)]
    pub range: RangePreset,

    /// Custom window start (YYYY-MM-DD or YYYY-MM-DDTHH:MM, UTC). Requires --end.
    #[arg(long, value_parser = parse_instant, requires = "end")]
    pub start: Option<DateTime<Utc>>,

    /// Custom window end, exclusive. Requires --start.
    #[arg(long, value_parser = parse_instant, requires = "start")]
    pub end: Option<DateTime<Utc>>,
}

impl WindowArgs {
    pub fn date_range(&self) -> DateRange {
        match (self.start, self.end) {
            (Some(start), Some(end)) => DateRange::Custom { start, end },
            _ => DateRange::Preset(self.range),
        }
    }
}

/// Chart and output options shared by `fetch` and `compare`.
#[derive(Debug, Args, Clone)]
pub struct OutputArgs {
    /// Chart kind.
    #[arg(short = 'k', long, value_enum, default_value_t = ChartKind::Line)]
    pub kind: ChartKind,

    /// Category label style (auto picks time-of-day for single-day windows).
    #[arg(long, value_enum, default_value_t = LabelStyle::Auto)]
    pub labels: LabelStyle,

    /// Fill the area under line series.
    #[arg(long)]
    pub fill: bool,

    /// Hide grid lines in exported descriptors.
    #[arg(long)]
    pub no_grid: bool,

    /// Disable the terminal plot.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,

    /// Print the fetch result(s) as JSON instead of the table and plot.
    #[arg(long)]
    pub json: bool,

    /// Export the chart data to CSV.
    #[arg(long = "export-csv", value_name = "CSV")]
    pub export_csv: Option<PathBuf>,

    /// Export the chart descriptor to JSON (re-plot with `entsoe plot`).
    #[arg(long = "export-json", value_name = "JSON")]
    pub export_json: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct FetchArgs {
    /// Metric to fetch.
    #[arg(short = 'm', long, value_enum, default_value_t = MetricKind::DayAheadPrice)]
    pub metric: MetricKind,

    /// Bidding zone: alias (AT, DE, ...) or EIC code. Defaults to the configured area.
    #[arg(short = 'a', long)]
    pub area: Option<String>,

    #[command(flatten)]
    pub window: WindowArgs,

    #[command(flatten)]
    pub output: OutputArgs,

    /// Write the raw fetch result (success flag, parsed data or error) to JSON.
    #[arg(long = "export-result", value_name = "JSON")]
    pub export_result: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct CompareArgs {
    /// Dataset as METRIC:AREA[:LABEL], e.g. `actual-load:AT:Load Austria`. Repeatable.
    #[arg(short = 'd', long = "dataset", value_name = "METRIC:AREA[:LABEL]", value_parser = parse_dataset, required = true)]
    pub datasets: Vec<DatasetSpec>,

    #[command(flatten)]
    pub window: WindowArgs,

    #[command(flatten)]
    pub output: OutputArgs,
}

/// Options for plotting a saved descriptor.
#[derive(Debug, Args, Clone)]
pub struct PlotArgs {
    /// Descriptor JSON file produced by `--export-json`.
    #[arg(long, value_name = "JSON")]
    pub descriptor: PathBuf,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,
}

#[derive(Debug, Args, Clone)]
pub struct TuiArgs {
    /// Initial metric.
    #[arg(short = 'm', long, value_enum, default_value_t = MetricKind::DayAheadPrice)]
    pub metric: MetricKind,

    /// Initial bidding zone (alias or EIC code).
    #[arg(short = 'a', long)]
    pub area: Option<String>,

    /// Initial date range preset.
    #[arg(short = 'r', long, value_enum, default_value_t = RangePreset::Today)]
    pub range: RangePreset,

    /// Initial chart kind.
    #[arg(short = 'k', long, value_enum, default_value_t = ChartKind::Line)]
    pub kind: ChartKind,
}

/// Parse `METRIC:AREA[:LABEL]`. The label may itself contain colons.
pub fn parse_dataset(raw: &str) -> Result<DatasetSpec, String> {
    let mut parts = raw.splitn(3, ':');
    let metric = parts.next().unwrap_or_default().trim();
    let area = parts.next().map(str::trim).unwrap_or_default();
    if metric.is_empty() || area.is_empty() {
        return Err(format!("expected METRIC:AREA[:LABEL], got '{raw}'"));
    }

    let metric = <MetricKind as ValueEnum>::from_str(metric, true).map_err(|_| {
        let known: Vec<String> = MetricKind::value_variants()
            .iter()
            .filter_map(|m| m.to_possible_value().map(|v| v.get_name().to_string()))
            .collect();
        format!("unknown metric '{metric}' (expected one of: {})", known.join(", "))
    })?;

    let mut dataset = DatasetSpec::new(metric, area);
    dataset.label = parts.next().map(str::trim).filter(|l| !l.is_empty()).map(str::to_string);
    Ok(dataset)
}

/// Parse a UTC instant from `YYYY-MM-DD`, `YYYY-MM-DDTHH:MM` or RFC 3339.
pub fn parse_instant(raw: &str) -> Result<DateTime<Utc>, String> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M") {
        return Ok(dt.and_utc());
    }
    if let Ok(d) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(d.and_time(NaiveTime::MIN).and_utc());
    }
    Err(format!("invalid date '{raw}' (expected YYYY-MM-DD or YYYY-MM-DDTHH:MM)"))
}
