//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the pipeline code stays clean and testable
//! - output changes are localized (important for snapshot tests)

use chrono::{DateTime, Utc};

use crate::domain::{FetchResult, MarketData, area_label};
use crate::report::SeriesSummary;

/// Header for one fetch or comparison run.
pub fn format_run_header(
    title: &str,
    areas: &[&str],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    cached: bool,
) -> String {
    let mut out = String::new();
    out.push_str(&format!("=== entsoe - {title} ===\n"));
    let names: Vec<String> = areas.iter().map(|a| format!("{} ({a})", area_label(a))).collect();
    out.push_str(&format!("Area: {}\n", names.join(", ")));
    out.push_str(&format!(
        "Window: {} .. {} UTC\n",
        start.format("%Y-%m-%d %H:%M"),
        end.format("%Y-%m-%d %H:%M")
    ));
    if cached {
        out.push_str("Source: cache\n");
    }
    out.push('\n');
    out
}

/// One-line description of a parsed result.
pub fn format_data_shape(data: &MarketData) -> String {
    match data {
        MarketData::Single(s) => format!("{}: {} points ({})", s.name, s.len(), s.unit),
        MarketData::Categorized(m) => format!(
            "{} categories, {} points ({})",
            m.categories.len(),
            m.categories.iter().map(|c| c.len()).sum::<usize>(),
            m.unit
        ),
    }
}

pub fn format_fetch_failure(result: &FetchResult) -> String {
    format!("Fetch failed: {}", result.error.as_deref().unwrap_or("unknown error"))
}

/// Per-series statistics table.
pub fn format_summary_table(rows: &[SeriesSummary]) -> String {
    let mut out = String::new();
    out.push_str(
        format!(
            "{:<32} {:>7} {:>6} {:>12} {:>12} {:>12} {:<8}\n",
            "series", "points", "gaps", "min", "max", "mean", "unit"
        )
        .trim_end(),
    );
    out.push('\n');

    out.push_str(
        format!(
            "{:-<32} {:-<7} {:-<6} {:-<12} {:-<12} {:-<12} {:-<8}\n",
            "", "", "", "", "", "", ""
        )
        .trim_end(),
    );
    out.push('\n');

    for r in rows {
        out.push_str(
            format!(
                "{:<32} {:>7} {:>6} {:>12} {:>12} {:>12} {:<8}\n",
                truncate(&r.label, 32),
                r.points,
                r.gaps,
                fmt_opt(r.min),
                fmt_opt(r.max),
                fmt_opt(r.mean),
                r.unit,
            )
            .trim_end(),
        );
        out.push('\n');
    }

    out
}

fn fmt_opt(v: Option<f64>) -> String {
    match v {
        Some(v) => format!("{v:.2}"),
        None => "-".to_string(),
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn summary_table_golden() {
        let rows = vec![
            SeriesSummary {
                label: "Actual Load (MW)".into(),
                unit: "MW".into(),
                points: 24,
                gaps: 0,
                min: Some(5000.0),
                max: Some(7250.5),
                mean: Some(6100.25),
            },
            SeriesSummary {
                label: "A very long generation category label (MW)".into(),
                unit: "MW".into(),
                points: 0,
                gaps: 24,
                min: None,
                max: None,
                mean: None,
            },
        ];
        let txt = format_summary_table(&rows);
        let lines: Vec<&str> = txt.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("series"));
        assert!(lines[2].starts_with("Actual Load (MW)"));
        assert!(lines[2].contains("7250.50"));
        assert!(lines[3].starts_with("A very long generation category."));
        assert!(lines[3].contains("  -"));
    }

    #[test]
    fn header_names_areas() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        let txt = format_run_header("Actual Load", &["10YAT-APG------L"], start, end, true);
        assert!(txt.contains("Area: Austria (10YAT-APG------L)"));
        assert!(txt.contains("Window: 2024-01-01 00:00 .. 2024-01-02 00:00 UTC"));
        assert!(txt.contains("Source: cache"));
    }
}
