//! Export chart data to CSV and fetch results to JSON.
//!
//! The CSV is meant to be easy to consume in spreadsheets or downstream scripts:
//! one row per category, one column per series, empty cells for gaps.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::chart::{Category, ChartDescriptor};
use crate::domain::FetchResult;
use crate::error::AppError;

/// Write a descriptor's data table to a CSV file.
pub fn write_descriptor_csv(path: &Path, descriptor: &ChartDescriptor) -> Result<(), AppError> {
    let mut file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export CSV '{}': {e}", path.display())))?;
    file.write_all(descriptor_csv(descriptor).as_bytes())
        .map_err(|e| AppError::new(2, format!("Failed to write export CSV: {e}")))?;
    Ok(())
}

/// CSV text for a descriptor. Time categories are written as RFC 3339 UTC.
pub fn descriptor_csv(descriptor: &ChartDescriptor) -> String {
    let mut out = String::new();

    let mut header = vec!["category".to_string()];
    header.extend(descriptor.series.iter().map(|s| csv_field(&s.label)));
    out.push_str(&header.join(","));
    out.push('\n');

    for (j, category) in descriptor.categories.iter().enumerate() {
        let mut row = vec![match category {
            Category::Instant(t) => t.to_rfc3339(),
            Category::Label(l) => csv_field(l),
        }];
        for s in &descriptor.series {
            // Pie slices carry one value each, on their own category.
            let value = if descriptor.kind == crate::chart::ChartKind::Pie {
                (s.label == category.display(descriptor.label_style))
                    .then(|| s.values.first().copied().flatten())
                    .flatten()
            } else {
                s.values.get(j).copied().flatten()
            };
            row.push(value.map(|v| format!("{v:.4}")).unwrap_or_default());
        }
        out.push_str(&row.join(","));
        out.push('\n');
    }

    out
}

/// Write a fetch result as pretty JSON.
pub fn write_fetch_result_json(path: &Path, result: &FetchResult) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, result)
        .map_err(|e| AppError::new(2, format!("Failed to write export JSON: {e}")))?;
    Ok(())
}

fn csv_field(s: &str) -> String {
    if s.contains([',', '"', '\n']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::{ChartKind, ChartOptions, build_categorized, build_comparison};
    use crate::domain::{MultiSeries, Point, Series};
    use chrono::{Duration, TimeZone, Utc};

    fn t(h: i64) -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::hours(h)
    }

    #[test]
    fn gaps_are_empty_cells() {
        let a = Series::with_points("Load, AT", "MW", vec![Point::new(t(0), 1.0), Point::new(t(1), 2.0)]);
        let b = Series::with_points("Load DE", "MW", vec![Point::new(t(1), 3.5)]);
        let d = build_comparison(&[a, b], &ChartOptions::default()).unwrap();

        let csv = descriptor_csv(&d);
        let expected = concat!(
            "category,\"Load, AT (MW)\",Load DE (MW)\n",
            "2024-01-01T00:00:00+00:00,1.0000,\n",
            "2024-01-01T01:00:00+00:00,2.0000,3.5000\n",
        );
        assert_eq!(csv, expected);
    }

    #[test]
    fn pie_rows_hold_one_slice_each() {
        let mut multi = MultiSeries::new("MW");
        multi.category_mut("Solar").points.push(Point::new(t(0), 10.0));
        multi.category_mut("Gas").points.push(Point::new(t(0), 30.0));
        let d = build_categorized(&multi, &ChartOptions::with_kind(ChartKind::Pie));

        assert_eq!(descriptor_csv(&d), "category,Solar,Gas\nSolar,10.0000,\nGas,,30.0000\n");
    }

    #[test]
    fn files_are_written() {
        let dir = tempfile::tempdir().unwrap();
        let a = Series::with_points("x", "MW", vec![Point::new(t(0), 1.0)]);
        let d = build_comparison(&[a], &ChartOptions::default()).unwrap();

        let csv_path = dir.path().join("out.csv");
        write_descriptor_csv(&csv_path, &d).unwrap();
        assert!(std::fs::read_to_string(&csv_path).unwrap().starts_with("category,x (MW)\n"));

        let json_path = dir.path().join("out.json");
        let result = FetchResult::ok(crate::domain::MarketData::Single(Series::new("x", "MW")), false);
        write_fetch_result_json(&json_path, &result).unwrap();
        let back: FetchResult = serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
        assert_eq!(back, result);
    }
}
