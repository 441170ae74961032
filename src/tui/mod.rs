//! Ratatui-based terminal UI.
//!
//! The TUI provides a settings panel for choosing a metric, bidding zone, date
//! range and chart kind, then fetches the data and renders the chart. Fetch and
//! configuration errors are shown in place of the chart.

use std::io;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph},
};
use tokio::runtime::Runtime;

use crate::app::pipeline::Orchestrator;
use crate::chart::{ChartDescriptor, ChartKind, ChartOptions};
use crate::cli::TuiArgs;
use crate::config::Config;
use crate::data::EntsoeClient;
use crate::domain::area::cycle_area;
use crate::domain::{DateRange, MetricKind, RangePreset, area_label, normalize_area_code};
use crate::error::AppError;

mod plotters_chart;

use plotters_chart::{DescriptorPlottersChart, PlotData, plot_data};

/// Start the TUI.
pub fn run(args: TuiArgs, config: &Config, runtime: &Runtime) -> Result<(), AppError> {
    let mut app = App::new(args, config, runtime);
    app.refresh();

    let _guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::new(4, format!("Failed to initialize terminal: {e}")))?;

    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::new(4, format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::new(4, format!("Failed to enter alternate screen: {e}")));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

const FIELD_COUNT: usize = 4;

/// What the chart panel currently shows.
enum ChartState {
    Waiting,
    Ready {
        descriptor: ChartDescriptor,
        data: PlotData,
        labels: Vec<String>,
    },
    Failed(String),
}

struct App<'rt> {
    runtime: &'rt Runtime,
    /// `Err` holds the reason the upstream client could not be built.
    orchestrator: Result<Orchestrator<EntsoeClient>, String>,
    metric: MetricKind,
    area: String,
    range: RangePreset,
    kind: ChartKind,
    selected_field: usize,
    status: String,
    chart: ChartState,
}

impl<'rt> App<'rt> {
    fn new(args: TuiArgs, config: &Config, runtime: &'rt Runtime) -> Self {
        let orchestrator = Orchestrator::from_config(config).map_err(|e| e.to_string());
        let area = match args.area.as_deref() {
            Some(a) => normalize_area_code(a),
            None => normalize_area_code(&config.default_area),
        };
        Self {
            runtime,
            orchestrator,
            metric: args.metric,
            area,
            range: args.range,
            kind: args.kind,
            selected_field: 0,
            status: String::new(),
            chart: ChartState::Waiting,
        }
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::new(4, format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::new(4, format!("Event poll error: {e}")))?
            {
                continue;
            }

            match event::read().map_err(|e| AppError::new(4, format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code) {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Returns true when the user asked to quit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Up => {
                if self.selected_field > 0 {
                    self.selected_field -= 1;
                }
            }
            KeyCode::Down => {
                if self.selected_field + 1 < FIELD_COUNT {
                    self.selected_field += 1;
                }
            }
            KeyCode::Left => self.adjust_field(false),
            KeyCode::Right => self.adjust_field(true),
            KeyCode::Char('m') => {
                self.metric = self.metric.next();
                self.refresh();
            }
            KeyCode::Char('a') => {
                self.area = cycle_area(&self.area, true).code.to_string();
                self.refresh();
            }
            KeyCode::Char('d') => {
                self.range = self.range.next();
                self.refresh();
            }
            KeyCode::Char('k') => {
                self.kind = self.kind.next();
                self.refresh();
            }
            KeyCode::Char('r') => self.refresh(),
            _ => {}
        }
        false
    }

    fn adjust_field(&mut self, forward: bool) {
        match self.selected_field {
            0 => {
                self.metric = if forward { self.metric.next() } else { self.metric.prev() };
            }
            1 => {
                self.area = cycle_area(&self.area, forward).code.to_string();
            }
            2 => {
                self.range = if forward { self.range.next() } else { prev_range(self.range) };
            }
            3 => {
                self.kind = if forward { self.kind.next() } else { prev_kind(self.kind) };
            }
            _ => return,
        }
        self.refresh();
    }

    /// Fetch the current selection and rebuild the chart. Blocks until done.
    fn refresh(&mut self) {
        let orchestrator = match &self.orchestrator {
            Ok(o) => o,
            Err(msg) => {
                self.chart = ChartState::Failed(msg.clone());
                self.status = "Set ENTSOE_API_KEY to fetch data.".to_string();
                return;
            }
        };

        let outcome = DateRange::Preset(self.range)
            .resolve(chrono::Utc::now())
            .and_then(|(start, end)| orchestrator.request(self.metric, start, end, Some(&self.area)))
            .and_then(|request| {
                let options = ChartOptions::with_kind(self.kind);
                self.runtime
                    .block_on(orchestrator.fetch_and_build(std::slice::from_ref(&request), &options))
            });

        match outcome {
            Ok(descriptor) => {
                self.status = format!(
                    "{} points over {} categories",
                    descriptor.series.iter().map(|s| s.present_values().count()).sum::<usize>(),
                    descriptor.categories.len()
                );
                self.chart = ChartState::Ready {
                    data: plot_data(&descriptor),
                    labels: descriptor.category_labels(),
                    descriptor,
                };
            }
            Err(err) => {
                self.status = "Fetch failed.".to_string();
                self.chart = ChartState::Failed(err.to_string());
            }
        }
    }

    fn draw(&mut self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(4), Constraint::Min(0), Constraint::Length(3)])
            .split(size);

        self.draw_header(frame, chunks[0]);
        self.draw_body(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let mut lines: Vec<Line> = Vec::new();
        lines.push(Line::from(vec![
            Span::styled("entsoe", Style::default().fg(Color::Cyan)),
            Span::raw(" - European power market charts"),
        ]));

        lines.push(Line::from(Span::styled(
            format!(
                "metric: {} | area: {} ({}) | range: {} | chart: {}",
                self.metric.display_name(),
                area_label(&self.area),
                self.area,
                self.range.display_name(),
                self.kind.display_name(),
            ),
            Style::default().fg(Color::Gray),
        )));

        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_body(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(6)])
            .split(area);

        self.draw_chart(frame, chunks[0]);
        self.draw_settings(frame, chunks[1]);
    }

    fn draw_chart(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let title = format!("{} ({})", self.metric.display_name(), self.metric.unit());
        let block = Block::default().title(title).borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        let (descriptor, data, labels) = match &self.chart {
            ChartState::Waiting => {
                let msg = Paragraph::new("Waiting for data...").style(Style::default().fg(Color::Yellow));
                frame.render_widget(msg, inner);
                return;
            }
            ChartState::Failed(msg) => {
                let p = Paragraph::new(msg.as_str())
                    .style(Style::default().fg(Color::Red).add_modifier(Modifier::BOLD))
                    .wrap(ratatui::widgets::Wrap { trim: true });
                frame.render_widget(p, inner);
                return;
            }
            ChartState::Ready {
                descriptor,
                data,
                labels,
            } => (descriptor, data, labels),
        };

        if descriptor.is_empty() || descriptor.kind == ChartKind::Pie {
            // Pie charts are drawn as a share list; plotters has no room for slices here.
            let txt = crate::plot::render_ascii_plot(descriptor, inner.width as usize, inner.height as usize);
            frame.render_widget(Paragraph::new(txt), inner);
            return;
        }

        let unit = descriptor.series.first().map(|s| s.unit.clone()).unwrap_or_default();
        let (chart_rect, insets) = chart_layout(inner);
        let widget = DescriptorPlottersChart {
            data,
            categories: labels,
            y_label: unit.clone(),
        };

        frame.render_widget(widget, chart_rect);
        if let Some(insets) = insets {
            draw_axis_ticks(frame, inner, chart_rect, insets, data, labels, &unit);
        }
    }

    fn draw_settings(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let items = vec![
            ListItem::new(format!("Metric: {}", self.metric.display_name())),
            ListItem::new(format!("Area: {}", area_label(&self.area))),
            ListItem::new(format!("Range: {}", self.range.display_name())),
            ListItem::new(format!("Chart: {}", self.kind.display_name())),
        ];

        let list = List::new(items)
            .block(Block::default().title("Settings").borders(Borders::ALL))
            .highlight_style(Style::default().fg(Color::Black).bg(Color::White))
            .highlight_symbol("» ");

        let mut state = ratatui::widgets::ListState::default();
        state.select(Some(self.selected_field));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "↑/↓ select  ←/→ adjust  m metric  a area  d range  k chart  r refresh  q quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

fn prev_range(cur: RangePreset) -> RangePreset {
    let n = RangePreset::ALL.len();
    let idx = RangePreset::ALL.iter().position(|&p| p == cur).unwrap_or(0);
    RangePreset::ALL[(idx + n - 1) % n]
}

fn prev_kind(cur: ChartKind) -> ChartKind {
    let n = ChartKind::ALL.len();
    let idx = ChartKind::ALL.iter().position(|&k| k == cur).unwrap_or(0);
    ChartKind::ALL[(idx + n - 1) % n]
}

#[derive(Debug, Clone, Copy)]
struct AxisInsets {
    left: u16,
    right: u16,
    top: u16,
    bottom: u16,
}

fn chart_layout(inner: Rect) -> (Rect, Option<AxisInsets>) {
    let insets = AxisInsets {
        left: 8,
        right: 2,
        top: 1,
        bottom: 2,
    };

    if inner.width <= insets.left + insets.right + 10 || inner.height <= insets.top + insets.bottom + 5 {
        return (inner, None);
    }

    let rect = Rect {
        x: inner.x + insets.left,
        y: inner.y + insets.top,
        width: inner.width - insets.left - insets.right,
        height: inner.height - insets.top - insets.bottom,
    };

    (rect, Some(insets))
}

/// Category label nearest to a fractional x position.
fn tick_label(labels: &[String], x: f64) -> String {
    if labels.is_empty() || !x.is_finite() {
        return String::new();
    }
    let idx = x.round().clamp(0.0, (labels.len() - 1) as f64) as usize;
    labels[idx].clone()
}

fn draw_axis_ticks(
    frame: &mut ratatui::Frame<'_>,
    inner: Rect,
    chart: Rect,
    insets: AxisInsets,
    data: &PlotData,
    labels: &[String],
    unit: &str,
) {
    let ticks = 5usize;
    let style = Style::default().fg(Color::Gray);
    let x_bounds = data.x_bounds;
    let y_bounds = data.y_bounds;

    for i in 0..ticks {
        let u = i as f64 / (ticks as f64 - 1.0);
        let x_val = x_bounds[0] + u * (x_bounds[1] - x_bounds[0]);
        let x = chart.x + ((chart.width - 1) as f64 * u).round() as u16;
        let label = tick_label(labels, x_val);
        let label_len = label.chars().count() as u16;
        let start = x
            .saturating_sub(label_len / 2)
            .min((inner.x + inner.width).saturating_sub(label_len));
        let y = chart.y + chart.height;
        if y >= inner.y + inner.height - 1 {
            continue;
        }
        frame.render_widget(
            Paragraph::new(label).style(style),
            Rect {
                x: start,
                y,
                width: label_len,
                height: 1,
            },
        );
    }

    for i in 0..ticks {
        let u = i as f64 / (ticks as f64 - 1.0);
        let y_val = y_bounds[0] + u * (y_bounds[1] - y_bounds[0]);
        let y = chart.y + (chart.height - 1) - ((chart.height - 1) as f64 * u).round() as u16;
        let label = format!("{:.0}", y_val);
        let label_len = label.len() as u16;
        let x = inner.x + insets.left.saturating_sub(1);
        let start = x.saturating_sub(label.len() as u16);
        if start < inner.x {
            continue;
        }
        frame.render_widget(
            Paragraph::new(label).style(style),
            Rect {
                x: start,
                y,
                width: label_len,
                height: 1,
            },
        );
    }

    let x_label = Paragraph::new("time (UTC)")
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::Gray));
    let x_rect = Rect {
        x: chart.x,
        y: chart.y + chart.height + 1,
        width: chart.width,
        height: 1,
    };
    if x_rect.y < inner.y + inner.height {
        frame.render_widget(x_label, x_rect);
    }

    let y_label = Paragraph::new(unit.to_string()).style(Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD));
    let y_rect = Rect {
        x: inner.x,
        y: inner.y,
        width: insets.left.saturating_sub(1),
        height: 1,
    };
    frame.render_widget(y_label, y_rect);
}
