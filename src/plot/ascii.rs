//! ASCII/Unicode plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements:
//! - one marker character per series (`*`, `o`, `+`, ...)
//! - line charts: `.` segments between neighbouring samples, never across a gap
//! - bar charts: marker columns (stacked charts start each column on the one below)
//! - pie charts: a percentage bar list instead of a grid

use crate::chart::{ChartDescriptor, ChartKind};

const MARKERS: [char; 8] = ['*', 'o', '+', 'x', '#', '@', '%', '&'];

fn marker(idx: usize) -> char {
    MARKERS[idx % MARKERS.len()]
}

/// Render a descriptor as text.
pub fn render_ascii_plot(descriptor: &ChartDescriptor, width: usize, height: usize) -> String {
    if descriptor.kind == ChartKind::Pie {
        return render_pie(descriptor, width);
    }
    if descriptor.is_empty() {
        return "No data in the selected range.\n".to_string();
    }
    render_grid(descriptor, width, height)
}

fn render_grid(descriptor: &ChartDescriptor, width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);
    let n = descriptor.categories.len();
    let stacked = descriptor.is_stacked();

    let (tops, bases) = plotted_values(descriptor, stacked);
    let (y_min, y_max) = y_range(&tops).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];

    for (i, series_tops) in tops.iter().enumerate() {
        let ch = marker(i);
        match descriptor.kind {
            ChartKind::Bar | ChartKind::StackedBar => {
                for (j, top) in series_tops.iter().enumerate() {
                    let Some(top) = *top else { continue };
                    let x = map_x(j, n, width);
                    let y_top = map_y(top, y_min, y_max, height);
                    let y_base = bases[i][j].map_or(height - 1, |b| map_y(b, y_min, y_max, height));
                    let (lo, hi) = if y_top <= y_base { (y_top, y_base) } else { (y_base, y_top) };
                    for row in grid.iter_mut().take(hi + 1).skip(lo) {
                        if row[x] == ' ' {
                            row[x] = ch;
                        }
                    }
                    grid[y_top][x] = ch;
                }
            }
            ChartKind::Line | ChartKind::Pie => {
                let mut prev: Option<(usize, usize)> = None;
                for (j, value) in series_tops.iter().enumerate() {
                    let Some(v) = *value else {
                        prev = None;
                        continue;
                    };
                    let x = map_x(j, n, width);
                    let y = map_y(v, y_min, y_max, height);
                    if let Some((x0, y0)) = prev {
                        draw_line(&mut grid, x0, y0, x, y, '.');
                    }
                    grid[y][x] = ch;
                    prev = Some((x, y));
                }
            }
        }
    }

    let labels = descriptor.category_labels();
    let first = labels.first().map(String::as_str).unwrap_or("");
    let last = labels.last().map(String::as_str).unwrap_or("");
    let unit = descriptor
        .axes
        .as_ref()
        .and_then(|a| a.y_title.as_deref())
        .unwrap_or("");

    let mut out = String::new();
    out.push_str(&format!("Plot: {first} .. {last} | y=[{y_min:.2}, {y_max:.2}] {unit}").trim_end());
    out.push('\n');

    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }

    for (i, s) in descriptor.series.iter().enumerate() {
        out.push_str(&format!("{} {}\n", marker(i), s.label));
    }

    out
}

/// Values as drawn (cumulative when stacked) plus each bar's base.
type Plotted = (Vec<Vec<Option<f64>>>, Vec<Vec<Option<f64>>>);

fn plotted_values(descriptor: &ChartDescriptor, stacked: bool) -> Plotted {
    let n = descriptor.categories.len();
    if !stacked {
        let tops: Vec<Vec<Option<f64>>> = descriptor
            .series
            .iter()
            .map(|s| s.values.iter().take(n).copied().collect())
            .collect();
        let bases = tops.iter().map(|t| vec![None; t.len()]).collect();
        return (tops, bases);
    }

    let mut running: Vec<Option<f64>> = vec![None; n];
    let mut tops = Vec::with_capacity(descriptor.series.len());
    let mut bases = Vec::with_capacity(descriptor.series.len());
    for s in &descriptor.series {
        let mut top = vec![None; n];
        let mut base = vec![None; n];
        for (j, value) in s.values.iter().enumerate().take(n) {
            if let Some(v) = value {
                base[j] = running[j];
                let t = running[j].unwrap_or(0.0) + v;
                running[j] = Some(t);
                top[j] = Some(t);
            }
        }
        tops.push(top);
        bases.push(base);
    }
    (tops, bases)
}

fn render_pie(descriptor: &ChartDescriptor, width: usize) -> String {
    let slices: Vec<(&str, f64, &str)> = descriptor
        .series
        .iter()
        .filter_map(|s| s.values.first().copied().flatten().map(|v| (s.label.as_str(), v, s.unit.as_str())))
        .collect();
    let total: f64 = slices.iter().map(|(_, v, _)| v).sum();
    // Shares of absolute volume; the signed net can be zero.
    let volume: f64 = slices.iter().map(|(_, v, _)| v.abs()).sum();
    if slices.is_empty() || volume == 0.0 {
        return "No data in the selected range.\n".to_string();
    }

    let label_w = slices.iter().map(|(l, _, _)| l.chars().count()).max().unwrap_or(0).min(32);
    let bar_w = width.saturating_sub(label_w + 24).max(10);

    let mut out = String::new();
    out.push_str(&format!("Share of total ({:.0} {})\n", total, slices[0].2));
    for (label, value, unit) in &slices {
        let pct = value / volume * 100.0;
        let filled = ((pct.abs() / 100.0) * bar_w as f64).round() as usize;
        let bar: String = std::iter::repeat_n('#', filled.min(bar_w)).collect();
        out.push_str(&format!(
            "{:<label_w$} {:<bar_w$} {:>5.1}% ({:.0} {unit})\n",
            truncate(label, label_w),
            bar,
            pct,
            value,
        ));
    }
    out
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    s.chars().take(max).collect()
}

fn y_range(tops: &[Vec<Option<f64>>]) -> Option<(f64, f64)> {
    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    for v in tops.iter().flatten().flatten() {
        min_y = min_y.min(*v);
        max_y = max_y.max(*v);
    }
    if !(min_y.is_finite() && max_y.is_finite()) {
        return None;
    }
    if max_y > min_y {
        Some((min_y, max_y))
    } else {
        Some((min_y - 1.0, max_y + 1.0))
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(j: usize, n: usize, width: usize) -> usize {
    if n <= 1 {
        return 0;
    }
    let u = j as f64 / (n as f64 - 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

/// Integer line drawing (Bresenham-ish). Only fills blank cells.
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0
            && (y0 as usize) < grid.len()
            && x0 >= 0
            && (x0 as usize) < grid[0].len()
            && grid[y0 as usize][x0 as usize] == ' '
        {
            grid[y0 as usize][x0 as usize] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::{
        AxisConfig, Category, ChartOptions, DescriptorSeries, LabelStyle, LegendConfig, LegendPosition, build_pie,
    };
    use crate::domain::{MultiSeries, Point, Series};
    use chrono::{Duration, TimeZone, Utc};

    fn descriptor(kind: ChartKind, values: Vec<Vec<Option<f64>>>) -> ChartDescriptor {
        let n = values[0].len();
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        ChartDescriptor {
            kind,
            categories: (0..n)
                .map(|h| Category::Instant(t0 + Duration::hours(h as i64)))
                .collect(),
            series: values
                .into_iter()
                .enumerate()
                .map(|(i, values)| DescriptorSeries {
                    label: format!("S{i} (MW)"),
                    unit: "MW".into(),
                    values,
                    color: String::new(),
                    fill: false,
                })
                .collect(),
            axes: Some(AxisConfig {
                show_grid: true,
                stacked: kind == ChartKind::StackedBar,
                y_title: Some("MW".into()),
            }),
            legend: LegendConfig {
                show: true,
                position: LegendPosition::Top,
            },
            label_style: LabelStyle::TimeOfDay,
        }
    }

    #[test]
    fn plot_golden_snapshot_gap_is_not_connected() {
        let d = descriptor(ChartKind::Line, vec![vec![Some(0.0), None, Some(10.0)]]);
        let txt = render_ascii_plot(&d, 10, 5);
        let expected = concat!(
            "Plot: 00:00 .. 02:00 | y=[-0.50, 10.50] MW\n",
            "         *\n",
            "          \n",
            "          \n",
            "          \n",
            "*         \n",
            "* S0 (MW)\n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn plot_golden_snapshot_connected_line() {
        let d = descriptor(ChartKind::Line, vec![vec![Some(0.0), Some(5.0), Some(10.0)]]);
        let txt = render_ascii_plot(&d, 10, 5);
        let expected = concat!(
            "Plot: 00:00 .. 02:00 | y=[-0.50, 10.50] MW\n",
            "        .*\n",
            "      ..  \n",
            "    .*    \n",
            "  ..      \n",
            "*.        \n",
            "* S0 (MW)\n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn stacked_bars_reach_the_cumulative_total() {
        let d = descriptor(
            ChartKind::StackedBar,
            vec![vec![Some(5.0), Some(5.0)], vec![Some(5.0), None]],
        );
        let txt = render_ascii_plot(&d, 10, 5);
        let rows: Vec<&str> = txt.lines().skip(1).take(5).collect();
        // Column 0 holds the taller stack (second series on top); column 9 only the first series.
        assert_eq!(rows[0].chars().next(), Some('o'));
        assert!(rows.iter().all(|r| r.chars().nth(9) != Some('o')));
        assert!(txt.contains("o S1 (MW)"));
    }

    #[test]
    fn empty_descriptor_says_so() {
        let d = descriptor(ChartKind::Line, vec![vec![None, None]]);
        assert_eq!(render_ascii_plot(&d, 40, 10), "No data in the selected range.\n");
    }

    #[test]
    fn pie_renders_as_percentages() {
        let t = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut multi = MultiSeries::new("MW");
        multi
            .categories
            .push(Series::with_points("Solar", "MW", vec![Point::new(t, 25.0)]));
        multi
            .categories
            .push(Series::with_points("Nuclear", "MW", vec![Point::new(t, 75.0)]));
        let d = build_pie(&multi, &ChartOptions::with_kind(ChartKind::Pie));

        let txt = render_ascii_plot(&d, 60, 10);
        assert!(txt.starts_with("Share of total (100 MW)\n"));
        assert!(txt.contains(" 25.0% (25 MW)"));
        assert!(txt.contains(" 75.0% (75 MW)"));
    }

    #[test]
    fn pie_with_offsetting_slices_still_renders() {
        let t = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut multi = MultiSeries::new("MW");
        multi
            .categories
            .push(Series::with_points("Hydro Pumped Storage", "MW", vec![Point::new(t, -40.0)]));
        multi
            .categories
            .push(Series::with_points("Solar", "MW", vec![Point::new(t, 40.0)]));
        let d = build_pie(&multi, &ChartOptions::with_kind(ChartKind::Pie));

        let txt = render_ascii_plot(&d, 60, 10);
        assert!(txt.starts_with("Share of total (0 MW)\n"));
        assert!(txt.contains("-50.0% (-40 MW)"));
        assert!(txt.contains(" 50.0% (40 MW)"));
    }

    #[test]
    fn surplus_values_beyond_the_categories_are_ignored() {
        let mut d = descriptor(ChartKind::Line, vec![vec![Some(1.0), Some(2.0)]]);
        d.series[0].values.extend([Some(3.0), Some(4.0)]);
        let expected = render_ascii_plot(&descriptor(ChartKind::Line, vec![vec![Some(1.0), Some(2.0)]]), 40, 10);
        assert_eq!(render_ascii_plot(&d, 40, 10), expected);

        let mut d = descriptor(ChartKind::Bar, vec![vec![Some(1.0), Some(2.0)]]);
        d.series[0].values.push(Some(9.0));
        assert!(!render_ascii_plot(&d, 40, 10).is_empty());
    }
}
