//! Merge independently fetched series onto one shared time axis.
//!
//! The unified axis is the ascending union of every distinct timestamp across the
//! inputs, compared as instants. Each input gets one value per axis slot; slots
//! where the input has no sample are gaps (`None`).
//!
//! Each series is indexed once (`HashMap<instant, value>`), so alignment costs
//! `O(P log P)` in the total number of points rather than a scan per slot.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{MultiSeries, Point, Series};

/// Output of [`align`]: one shared axis plus one value row per input series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignedSeries {
    pub timestamps: Vec<DateTime<Utc>>,
    /// `values[i][j]` is input `i` at `timestamps[j]`.
    pub values: Vec<Vec<Option<f64>>>,
}

impl AlignedSeries {
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Rebuild input `idx` as a series on the shared axis (gaps included).
    pub fn series(&self, idx: usize, name: &str, unit: &str) -> Option<Series> {
        let row = self.values.get(idx)?;
        let points = self
            .timestamps
            .iter()
            .zip(row)
            .map(|(&timestamp, &value)| Point { timestamp, value })
            .collect();
        Some(Series::with_points(name, unit, points))
    }
}

/// Align `series` onto the sorted union of their timestamps.
///
/// When one input carries the same timestamp more than once, the first
/// occurrence in document order wins.
pub fn align(series: &[Series]) -> AlignedSeries {
    let axis: BTreeSet<DateTime<Utc>> = series
        .iter()
        .flat_map(|s| s.points.iter().map(|p| p.timestamp))
        .collect();
    let timestamps: Vec<DateTime<Utc>> = axis.into_iter().collect();

    let values = series
        .iter()
        .map(|s| {
            let index = index_series(s);
            timestamps
                .iter()
                .map(|t| index.get(t).copied().flatten())
                .collect()
        })
        .collect();

    AlignedSeries { timestamps, values }
}

fn index_series(series: &Series) -> HashMap<DateTime<Utc>, Option<f64>> {
    let mut index = HashMap::with_capacity(series.points.len());
    for p in &series.points {
        index.entry(p.timestamp).or_insert(p.value);
    }
    index
}

/// Collapse a category breakdown into one total series.
///
/// Each axis slot sums the non-gap category values; a slot where every category
/// is a gap stays a gap.
pub fn collapse_total(multi: &MultiSeries, name: &str) -> Series {
    let aligned = align(&multi.categories);
    let points = aligned
        .timestamps
        .iter()
        .enumerate()
        .map(|(j, &timestamp)| {
            let value = aligned
                .values
                .iter()
                .filter_map(|row| row[j])
                .fold(None, |acc: Option<f64>, v| Some(acc.unwrap_or(0.0) + v));
            Point { timestamp, value }
        })
        .collect();
    Series::with_points(name, multi.unit.clone(), points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t(minutes: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap() + Duration::minutes(minutes)
    }

    fn series(name: &str, pts: &[(i64, f64)]) -> Series {
        Series::with_points(
            name,
            "MW",
            pts.iter().map(|&(m, v)| Point::new(t(m), v)).collect(),
        )
    }

    #[test]
    fn overlapping_series_get_gaps() {
        let a = series("a", &[(0, 1.0), (60, 2.0)]);
        let b = series("b", &[(60, 20.0), (120, 30.0)]);
        let aligned = align(&[a, b]);

        assert_eq!(aligned.timestamps, vec![t(0), t(60), t(120)]);
        assert_eq!(aligned.values[0], vec![Some(1.0), Some(2.0), None]);
        assert_eq!(aligned.values[1], vec![None, Some(20.0), Some(30.0)]);
    }

    #[test]
    fn axis_is_sorted_by_instant_not_document_order() {
        let a = series("a", &[(120, 3.0), (0, 1.0)]);
        let b = series("b", &[(60, 2.0)]);
        let aligned = align(&[a, b]);
        assert_eq!(aligned.timestamps, vec![t(0), t(60), t(120)]);
        assert_eq!(aligned.values[0], vec![Some(1.0), None, Some(3.0)]);
    }

    #[test]
    fn axis_spanning_months_is_chronological() {
        // Label strings like "9:00" vs "10:00" or month rollovers would mis-sort lexically.
        let a = series("a", &[(60 * 24 * 40, 2.0), (60 * 9, 1.0)]);
        let aligned = align(&[a]);
        assert!(aligned.timestamps.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn aligning_one_chronological_series_is_identity() {
        let a = series("a", &[(0, 1.0), (15, 2.0), (30, 3.0)]);
        let aligned = align(std::slice::from_ref(&a));
        assert_eq!(aligned.series(0, "a", "MW").unwrap(), a);
    }

    #[test]
    fn duplicate_timestamps_keep_first_value() {
        let a = series("a", &[(0, 1.0), (0, 9.0)]);
        let aligned = align(&[a]);
        assert_eq!(aligned.values[0], vec![Some(1.0)]);
    }

    #[test]
    fn empty_inputs_align_to_empty_axis() {
        let aligned = align(&[]);
        assert!(aligned.is_empty());
        assert!(aligned.values.is_empty());

        let aligned = align(&[Series::new("empty", "MW"), series("b", &[(0, 1.0)])]);
        assert_eq!(aligned.values[0], vec![None]);
    }

    #[test]
    fn totals_sum_present_values_only() {
        let mut multi = MultiSeries::new("MW");
        multi.categories.push(series("Solar", &[(0, 10.0), (60, 20.0)]));
        multi.categories.push(series("Wind", &[(60, 5.0)]));
        multi.categories.push(Series::with_points("Gas", "MW", vec![Point::gap(t(120))]));

        let total = collapse_total(&multi, "Total");
        assert_eq!(total.values(), vec![Some(10.0), Some(25.0), None]);
        assert_eq!(total.unit, "MW");
    }
}
