//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - passed through the fetch → parse → align → chart pipeline
//! - returned to callers as JSON
//! - cached as parsed results

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// Unit of every price series.
pub const PRICE_UNIT: &str = "EUR/MWh";
/// Unit of load and generation series.
pub const POWER_UNIT: &str = "MW";

/// Category of market data requested from the upstream API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    DayAheadPrice,
    IntradayPrice,
    ActualLoad,
    ForecastedLoad,
    #[value(name = "generation")]
    GenerationByCategory,
}

impl MetricKind {
    pub const ALL: [MetricKind; 5] = [
        MetricKind::DayAheadPrice,
        MetricKind::IntradayPrice,
        MetricKind::ActualLoad,
        MetricKind::ForecastedLoad,
        MetricKind::GenerationByCategory,
    ];

    /// Stable key used in cache keys and JSON payloads.
    pub fn key(self) -> &'static str {
        match self {
            MetricKind::DayAheadPrice => "day_ahead_prices",
            MetricKind::IntradayPrice => "intraday_prices",
            MetricKind::ActualLoad => "actual_load",
            MetricKind::ForecastedLoad => "forecasted_load",
            MetricKind::GenerationByCategory => "generation_per_type",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            MetricKind::DayAheadPrice => "Day-Ahead Prices",
            MetricKind::IntradayPrice => "Intraday Prices",
            MetricKind::ActualLoad => "Actual Load",
            MetricKind::ForecastedLoad => "Forecasted Load",
            MetricKind::GenerationByCategory => "Generation per Type",
        }
    }

    pub fn unit(self) -> &'static str {
        if self.is_price() { PRICE_UNIT } else { POWER_UNIT }
    }

    pub fn is_price(self) -> bool {
        matches!(self, MetricKind::DayAheadPrice | MetricKind::IntradayPrice)
    }

    pub fn is_categorized(self) -> bool {
        self == MetricKind::GenerationByCategory
    }

    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|&m| m == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        let idx = Self::ALL.iter().position(|&m| m == self).unwrap_or(0);
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// One sample of a series. `value == None` is a gap.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub timestamp: DateTime<Utc>,
    pub value: Option<f64>,
}

impl Point {
    pub fn new(timestamp: DateTime<Utc>, value: f64) -> Self {
        Self {
            timestamp,
            value: Some(value),
        }
    }

    pub fn gap(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            value: None,
        }
    }
}

/// A named, single-unit time series.
///
/// Parsed series keep document order, which is usually but not necessarily
/// chronological. [`Series::is_chronological`] tells the two apart; alignment
/// always produces an ascending axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub name: String,
    pub unit: String,
    pub points: Vec<Point>,
}

impl Series {
    pub fn new(name: impl Into<String>, unit: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            unit: unit.into(),
            points: Vec::new(),
        }
    }

    pub fn with_points(name: impl Into<String>, unit: impl Into<String>, points: Vec<Point>) -> Self {
        Self {
            name: name.into(),
            unit: unit.into(),
            points,
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn timestamps(&self) -> Vec<DateTime<Utc>> {
        self.points.iter().map(|p| p.timestamp).collect()
    }

    pub fn values(&self) -> Vec<Option<f64>> {
        self.points.iter().map(|p| p.value).collect()
    }

    /// True when timestamps are strictly increasing (no duplicates).
    pub fn is_chronological(&self) -> bool {
        self.points.windows(2).all(|w| w[0].timestamp < w[1].timestamp)
    }
}

/// Generation breakdown: one series per category, all in the same unit.
///
/// Categories keep first-seen document order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiSeries {
    pub unit: String,
    pub categories: Vec<Series>,
}

impl MultiSeries {
    pub fn new(unit: impl Into<String>) -> Self {
        Self {
            unit: unit.into(),
            categories: Vec::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Series> {
        self.categories.iter().find(|s| s.name == name)
    }

    /// Get the category series, creating it (in the shared unit) on first use.
    pub fn category_mut(&mut self, name: &str) -> &mut Series {
        let idx = match self.categories.iter().position(|s| s.name == name) {
            Some(idx) => idx,
            None => {
                self.categories.push(Series::new(name, self.unit.clone()));
                self.categories.len() - 1
            }
        };
        &mut self.categories[idx]
    }

    pub fn names(&self) -> Vec<&str> {
        self.categories.iter().map(|s| s.name.as_str()).collect()
    }
}

/// Parsed result of one upstream document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum MarketData {
    Single(Series),
    Categorized(MultiSeries),
}

impl MarketData {
    pub fn unit(&self) -> &str {
        match self {
            MarketData::Single(s) => &s.unit,
            MarketData::Categorized(m) => &m.unit,
        }
    }

    /// Total number of points across all series.
    pub fn point_count(&self) -> usize {
        match self {
            MarketData::Single(s) => s.len(),
            MarketData::Categorized(m) => m.categories.iter().map(Series::len).sum(),
        }
    }
}

/// One upstream query.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FetchRequest {
    pub metric: MetricKind,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    pub area_code: String,
}

impl FetchRequest {
    /// Validates `period_start < period_end` and a non-empty area code.
    pub fn new(
        metric: MetricKind,
        period_start: DateTime<Utc>,
        period_end: DateTime<Utc>,
        area_code: impl Into<String>,
    ) -> Result<Self> {
        let area_code = area_code.into();
        if period_start >= period_end {
            return Err(PipelineError::Configuration(format!(
                "period start {period_start} must precede period end {period_end}"
            )));
        }
        if area_code.trim().is_empty() {
            return Err(PipelineError::Configuration("area code is required".to_string()));
        }
        Ok(Self {
            metric,
            period_start,
            period_end,
            area_code: area_code.trim().to_string(),
        })
    }
}

/// Caller-facing outcome of a single fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<MarketData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub cached: bool,
}

impl FetchResult {
    pub fn ok(data: MarketData, cached: bool) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            cached,
        }
    }

    pub fn failed(err: &PipelineError) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(err.to_string()),
            cached: false,
        }
    }
}
