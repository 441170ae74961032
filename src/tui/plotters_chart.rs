//! Plotters-powered descriptor chart widget for Ratatui.
//!
//! Why Plotters instead of Ratatui's built-in `Chart` widget?
//! - nicer axis + mesh rendering
//! - less manual work for ticks/labels
//! - bars and lines share one drawing path
//!
//! We render Plotters output into the Ratatui buffer using `plotters-ratatui-backend`.

use plotters::prelude::*;
use plotters_ratatui_backend::widget_fn;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color as TuiColor, Style},
    widgets::Widget,
};

use crate::chart::{ChartDescriptor, ChartKind};

/// One line series, split into segments at gaps.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotLine {
    pub color: RGBColor,
    pub segments: Vec<Vec<(f64, f64)>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlotBar {
    pub color: RGBColor,
    pub x0: f64,
    pub x1: f64,
    pub base: f64,
    pub top: f64,
}

/// Descriptor data in chart coordinates: x is the category index.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotData {
    pub lines: Vec<PlotLine>,
    pub bars: Vec<PlotBar>,
    pub x_bounds: [f64; 2],
    pub y_bounds: [f64; 2],
}

/// Parse `#rrggbb`; anything else falls back to white.
pub fn parse_hex_color(hex: &str) -> RGBColor {
    let h = hex.trim().trim_start_matches('#');
    if h.len() != 6 {
        return WHITE;
    }
    let channel = |i: usize| u8::from_str_radix(&h[i..i + 2], 16).ok();
    match (channel(0), channel(2), channel(4)) {
        (Some(r), Some(g), Some(b)) => RGBColor(r, g, b),
        _ => WHITE,
    }
}

/// Prepare descriptor series for drawing. Pie descriptors produce no data.
pub fn plot_data(descriptor: &ChartDescriptor) -> PlotData {
    let n = descriptor.categories.len();
    let mut lines = Vec::new();
    let mut bars = Vec::new();

    match descriptor.kind {
        ChartKind::Pie => {}
        ChartKind::Line => {
            for s in &descriptor.series {
                let mut segments = Vec::new();
                let mut current = Vec::new();
                for (j, v) in s.values.iter().enumerate().take(n) {
                    match v {
                        Some(v) => current.push((j as f64, *v)),
                        None if !current.is_empty() => segments.push(std::mem::take(&mut current)),
                        None => {}
                    }
                }
                if !current.is_empty() {
                    segments.push(current);
                }
                lines.push(PlotLine {
                    color: parse_hex_color(&s.color),
                    segments,
                });
            }
        }
        ChartKind::Bar | ChartKind::StackedBar => {
            let stacked = descriptor.is_stacked();
            let k = descriptor.series.len().max(1) as f64;
            let mut running = vec![0.0_f64; n];
            for (i, s) in descriptor.series.iter().enumerate() {
                let color = parse_hex_color(&s.color);
                for (j, v) in s.values.iter().enumerate().take(n) {
                    let Some(v) = *v else { continue };
                    let x = j as f64;
                    let bar = if stacked {
                        let base = running[j];
                        running[j] += v;
                        PlotBar {
                            color,
                            x0: x - 0.4,
                            x1: x + 0.4,
                            base,
                            top: running[j],
                        }
                    } else {
                        let w = 0.8 / k;
                        let x0 = x - 0.4 + w * i as f64;
                        PlotBar {
                            color,
                            x0,
                            x1: x0 + w,
                            base: 0.0,
                            top: v,
                        }
                    };
                    bars.push(bar);
                }
            }
        }
    }

    let mut y_min = f64::INFINITY;
    let mut y_max = f64::NEG_INFINITY;
    for (_, y) in lines.iter().flat_map(|l| l.segments.iter().flatten()) {
        y_min = y_min.min(*y);
        y_max = y_max.max(*y);
    }
    for b in &bars {
        y_min = y_min.min(b.base.min(b.top));
        y_max = y_max.max(b.base.max(b.top));
    }
    if !y_min.is_finite() || !y_max.is_finite() || y_max <= y_min {
        let mid = if y_min.is_finite() { y_min } else { 0.0 };
        y_min = mid - 1.0;
        y_max = mid + 1.0;
    }
    let pad = ((y_max - y_min).abs() * 0.05).max(1e-12);

    let x_bounds = if bars.is_empty() {
        [0.0, (n.max(2) - 1) as f64]
    } else {
        [-0.5, n.max(1) as f64 - 0.5]
    };

    PlotData {
        lines,
        bars,
        x_bounds,
        y_bounds: [y_min - pad, y_max + pad],
    }
}

/// A lightweight, render-only chart.
///
/// All series and bounds are computed outside the render call (see [`plot_data`]),
/// which keeps `render()` focused on drawing.
pub struct DescriptorPlottersChart<'a> {
    pub data: &'a PlotData,
    /// Category labels, indexed by x.
    pub categories: &'a [String],
    pub y_label: String,
}

impl<'a> Widget for DescriptorPlottersChart<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // When the available area is too small, Plotters may fail to build a chart.
        // In that case, we render a small hint rather than panicking.
        if area.width < 20 || area.height < 8 {
            buf.set_string(
                area.x,
                area.y,
                "Chart area too small (resize terminal).",
                Style::default().fg(TuiColor::Yellow),
            );
            return;
        }

        let [x0, x1] = self.data.x_bounds;
        let [y0, y1] = self.data.y_bounds;
        if !(x0.is_finite() && x1.is_finite() && y0.is_finite() && y1.is_finite()) || x1 <= x0 || y1 <= y0 {
            return;
        }

        let categories = self.categories;
        let fmt_x = move |v: &f64| {
            let idx = v.round();
            if idx < 0.0 {
                return String::new();
            }
            categories.get(idx as usize).cloned().unwrap_or_default()
        };

        let widget = widget_fn(move |root| {
            let mut chart = ChartBuilder::on(&root)
                .margin(1)
                // Terminal cells are low-res, so keep label areas compact.
                .set_label_area_size(LabelAreaPosition::Left, 8)
                .set_label_area_size(LabelAreaPosition::Bottom, 3)
                .build_cartesian_2d(x0..x1, y0..y1)?;

            // Mesh lines are disabled; in a terminal they mostly add noise.
            chart
                .configure_mesh()
                .disable_x_mesh()
                .disable_y_mesh()
                .y_desc(&self.y_label)
                .x_labels(5)
                .y_labels(5)
                .x_label_formatter(&fmt_x)
                .y_label_formatter(&|v| format!("{v:.0}"))
                .label_style(("sans-serif", 10).into_font().color(&WHITE))
                .axis_style(WHITE)
                .bold_line_style(WHITE)
                .draw()?;

            for bar in &self.data.bars {
                chart.draw_series(std::iter::once(Rectangle::new(
                    [(bar.x0, bar.base), (bar.x1, bar.top)],
                    bar.color.filled(),
                )))?;
            }

            for line in &self.data.lines {
                for segment in &line.segments {
                    if let [only] = segment.as_slice() {
                        // A lone sample between two gaps.
                        chart.draw_series(std::iter::once(Pixel::new(*only, line.color)))?;
                    } else {
                        chart.draw_series(LineSeries::new(segment.iter().copied(), &line.color))?;
                    }
                }
            }

            Ok(())
        });

        widget.render(area, buf);
    }
}
