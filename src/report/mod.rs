//! Reporting utilities: per-series statistics and formatted terminal output.

pub mod format;

pub use format::*;

use serde::Serialize;

use crate::chart::{ChartDescriptor, ChartKind};

/// Statistics of one descriptor series. Gaps are counted, not averaged.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesSummary {
    pub label: String,
    pub unit: String,
    pub points: usize,
    pub gaps: usize,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
}

/// Summarize every series of a descriptor, in descriptor order.
pub fn summarize(descriptor: &ChartDescriptor) -> Vec<SeriesSummary> {
    descriptor
        .series
        .iter()
        .map(|s| {
            let present: Vec<f64> = s.present_values().collect();
            let n = present.len();
            let min = present.iter().copied().reduce(f64::min);
            let max = present.iter().copied().reduce(f64::max);
            let mean = (n > 0).then(|| present.iter().sum::<f64>() / n as f64);
            SeriesSummary {
                label: s.label.clone(),
                unit: s.unit.clone(),
                points: n,
                gaps: s.values.len() - n,
                min,
                max,
                mean,
            }
        })
        .collect()
}

/// Sum of all pie slices, `None` for other chart kinds.
pub fn pie_total(descriptor: &ChartDescriptor) -> Option<f64> {
    (descriptor.kind == ChartKind::Pie).then(|| descriptor.series.iter().flat_map(|s| s.present_values()).sum())
}
