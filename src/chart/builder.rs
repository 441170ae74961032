//! Series → [`ChartDescriptor`].
//!
//! Pure transforms; no I/O. Three shapes:
//!
//! - single series: one descriptor series, categories in document order
//! - category breakdown: categories aligned onto one axis, palette colours in
//!   category order; pie charts collapse each category to its window total
//! - comparison: N inputs aligned onto one axis, caller labels/colours kept

use chrono::{DateTime, Duration, Utc};

use crate::chart::descriptor::{
    AxisConfig, Category, ChartDescriptor, ChartKind, ChartOptions, DescriptorSeries, LabelStyle, LegendConfig,
    LegendPosition,
};
use crate::domain::{MarketData, MultiSeries, Series, is_single_day};
use crate::error::{PipelineError, Result};
use crate::series::align;

/// `"Actual Load (MW)"`; the bare name when there is no unit.
pub fn legend_label(name: &str, unit: &str) -> String {
    if unit.is_empty() {
        name.to_string()
    } else {
        format!("{name} ({unit})")
    }
}

/// Label style for a requested window: time of day when it spans at most a day.
pub fn label_style_for_window(start: DateTime<Utc>, end: DateTime<Utc>) -> LabelStyle {
    if is_single_day(start, end) {
        LabelStyle::TimeOfDay
    } else {
        LabelStyle::DateTime
    }
}

/// Build from one parsed result.
pub fn build(data: &MarketData, options: &ChartOptions) -> ChartDescriptor {
    match data {
        MarketData::Single(series) => build_single(series, options),
        MarketData::Categorized(multi) => build_categorized(multi, options),
    }
}

/// One series. Pie is meaningless for a single series and is drawn as a line.
pub fn build_single(series: &Series, options: &ChartOptions) -> ChartDescriptor {
    let kind = match options.kind {
        ChartKind::Pie => ChartKind::Line,
        k => k,
    };
    let categories: Vec<Category> = series.points.iter().map(|p| Category::Instant(p.timestamp)).collect();
    let label_style = resolve_label_style(options.label_style, &categories);

    ChartDescriptor {
        kind,
        categories,
        series: vec![DescriptorSeries {
            label: legend_label(&series.name, &series.unit),
            unit: series.unit.clone(),
            values: series.values(),
            color: options.color_for(0),
            fill: options.fill,
        }],
        axes: Some(axes(options, kind, Some(series.unit.clone()))),
        legend: legend(options, LegendPosition::Top),
        label_style,
    }
}

/// Category breakdown. Bar charts of a breakdown are always stacked.
pub fn build_categorized(multi: &MultiSeries, options: &ChartOptions) -> ChartDescriptor {
    if options.kind == ChartKind::Pie {
        return build_pie(multi, options);
    }

    let aligned = align(&multi.categories);
    let series = multi
        .categories
        .iter()
        .zip(aligned.values)
        .enumerate()
        .map(|(i, (category, values))| DescriptorSeries {
            label: category.name.clone(),
            unit: multi.unit.clone(),
            values,
            color: options.color_for(i),
            fill: options.fill,
        })
        .collect();
    let categories: Vec<Category> = aligned.timestamps.into_iter().map(Category::Instant).collect();
    let label_style = resolve_label_style(options.label_style, &categories);

    let mut axis = axes(options, options.kind, Some(multi.unit.clone()));
    axis.stacked |= options.kind == ChartKind::Bar;

    ChartDescriptor {
        kind: options.kind,
        categories,
        series,
        axes: Some(axis),
        legend: legend(options, LegendPosition::Top),
        label_style,
    }
}

/// One slice per category with a nonzero window total.
///
/// Each descriptor series is a slice whose single value is the total; the
/// categories list the slice labels. Categories without any value, or whose
/// values sum to exactly zero, are left out.
pub fn build_pie(multi: &MultiSeries, options: &ChartOptions) -> ChartDescriptor {
    let mut categories = Vec::new();
    let mut series = Vec::new();

    for category in &multi.categories {
        let Some(total) = category
            .points
            .iter()
            .filter_map(|p| p.value)
            .fold(None, |acc: Option<f64>, v| Some(acc.unwrap_or(0.0) + v))
        else {
            continue;
        };
        if total == 0.0 {
            continue;
        }
        let idx = series.len();
        categories.push(Category::Label(category.name.clone()));
        series.push(DescriptorSeries {
            label: category.name.clone(),
            unit: multi.unit.clone(),
            values: vec![Some(total)],
            color: options.color_for(idx),
            fill: true,
        });
    }

    ChartDescriptor {
        kind: ChartKind::Pie,
        categories,
        series,
        axes: None,
        legend: legend(options, LegendPosition::Right),
        label_style: LabelStyle::DateTime,
    }
}

/// N independently fetched series on one shared axis.
///
/// Labels come from `options.labels` (falling back to the series name) and are
/// suffixed with the unit; colours from `options.colors`, then the palette.
pub fn build_comparison(inputs: &[Series], options: &ChartOptions) -> Result<ChartDescriptor> {
    if inputs.is_empty() {
        return Err(PipelineError::NoDatasets);
    }
    let kind = match options.kind {
        ChartKind::Pie => ChartKind::Line,
        k => k,
    };

    let aligned = align(inputs);
    let series = inputs
        .iter()
        .zip(aligned.values)
        .enumerate()
        .map(|(i, (input, values))| {
            let name = options.label_for(i).unwrap_or(&input.name);
            DescriptorSeries {
                label: legend_label(name, &input.unit),
                unit: input.unit.clone(),
                values,
                color: options.color_for(i),
                fill: options.fill,
            }
        })
        .collect();

    let first_unit = &inputs[0].unit;
    let shared_unit = inputs
        .iter()
        .all(|s| &s.unit == first_unit)
        .then(|| first_unit.clone());

    let categories: Vec<Category> = aligned.timestamps.into_iter().map(Category::Instant).collect();
    let label_style = resolve_label_style(options.label_style, &categories);

    Ok(ChartDescriptor {
        kind,
        categories,
        series,
        axes: Some(axes(options, kind, shared_unit)),
        legend: legend(options, LegendPosition::Top),
        label_style,
    })
}

fn axes(options: &ChartOptions, kind: ChartKind, y_title: Option<String>) -> AxisConfig {
    AxisConfig {
        show_grid: options.show_grid,
        stacked: options.stacked || kind == ChartKind::StackedBar,
        y_title,
    }
}

fn legend(options: &ChartOptions, position: LegendPosition) -> LegendConfig {
    LegendConfig {
        show: options.show_legend,
        position,
    }
}

fn resolve_label_style(style: LabelStyle, categories: &[Category]) -> LabelStyle {
    if style != LabelStyle::Auto {
        return style;
    }
    let instants = categories.iter().filter_map(Category::instant);
    let (min, max) = instants.fold((None, None), |(lo, hi): (Option<DateTime<Utc>>, Option<DateTime<Utc>>), t| {
        (Some(lo.map_or(t, |l| l.min(t))), Some(hi.map_or(t, |h| h.max(t))))
    });
    match (min, max) {
        (Some(lo), Some(hi)) if hi - lo < Duration::hours(24) => LabelStyle::TimeOfDay,
        _ => LabelStyle::DateTime,
    }
}
