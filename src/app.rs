//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and loads configuration
//! - installs logging
//! - fetches market data through the orchestrator
//! - prints reports/plots
//! - writes optional exports

use chrono::Utc;
use clap::Parser;
use tokio::runtime::Runtime;
use tracing_subscriber::EnvFilter;

use crate::app::pipeline::{ComparisonRequest, Orchestrator};
use crate::chart::{self, ChartDescriptor, ChartOptions, LabelStyle, label_style_for_window};
use crate::cli::{Command, CompareArgs, FetchArgs, OutputArgs, PlotArgs, TuiArgs};
use crate::config::Config;
use crate::error::AppError;
use crate::io::DescriptorFile;

pub mod pipeline;

/// Entry point for the `entsoe` binary.
pub fn run() -> Result<(), AppError> {
    // We want `entsoe` and `entsoe -m actual-load` to behave like `entsoe tui ...`.
    //
    // Clap requires a subcommand name, so we do a small, explicit rewrite of the
    // argv list before parsing.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    init_tracing(cli.verbose);
    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Command::Fetch(args) => handle_fetch(args, &config),
        Command::Compare(args) => handle_compare(args, &config),
        Command::Plot(args) => handle_plot(args),
        Command::Tui(args) => handle_tui(args, &config),
    }
}

/// Log to stderr so JSON on stdout stays machine-readable. `RUST_LOG` wins over `--verbose`.
fn init_tracing(verbose: bool) {
    let default = if verbose { "entsoe_charts=debug" } else { "entsoe_charts=info" };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn runtime() -> Result<Runtime, AppError> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| AppError::new(4, format!("Failed to start async runtime: {e}")))
}

fn handle_fetch(args: FetchArgs, config: &Config) -> Result<(), AppError> {
    let orchestrator = Orchestrator::from_config(config)?;
    let (start, end) = args.window.date_range().resolve(Utc::now())?;
    let request = orchestrator.request(args.metric, start, end, args.area.as_deref())?;

    let rt = runtime()?;
    let result = rt.block_on(orchestrator.fetch(
        request.metric,
        request.period_start,
        request.period_end,
        Some(&request.area_code),
    ));

    if let Some(path) = &args.export_result {
        crate::io::write_fetch_result_json(path, &result)?;
    }
    if args.output.json {
        let json = serde_json::to_string_pretty(&result)
            .map_err(|e| AppError::new(4, format!("Failed to serialize fetch result: {e}")))?;
        println!("{json}");
    }

    let Some(data) = result.data.as_ref().filter(|_| result.success) else {
        return Err(AppError::new(3, crate::report::format_fetch_failure(&result)));
    };
    if args.output.json {
        return Ok(());
    }

    let mut options = chart_options(&args.output);
    if options.label_style == LabelStyle::Auto {
        options.label_style = label_style_for_window(start, end);
    }
    let descriptor = chart::build(data, &options);

    print!(
        "{}",
        crate::report::format_run_header(
            args.metric.display_name(),
            &[request.area_code.as_str()],
            start,
            end,
            result.cached
        )
    );
    println!("{}", crate::report::format_data_shape(data));
    println!();

    let datasets = vec![format!("{}:{}", args.metric.key(), request.area_code)];
    print_and_export(&descriptor, &args.output, datasets)
}

fn handle_compare(args: CompareArgs, config: &Config) -> Result<(), AppError> {
    let orchestrator = Orchestrator::from_config(config)?;
    let (start, end) = args.window.date_range().resolve(Utc::now())?;
    let request = ComparisonRequest {
        period_start: start,
        period_end: end,
        datasets: args.datasets,
    };

    let rt = runtime()?;
    let descriptor = rt.block_on(orchestrator.compare(&request, &chart_options(&args.output)))?;

    let datasets: Vec<String> = request
        .datasets
        .iter()
        .map(|d| format!("{}:{}", d.metric.key(), crate::domain::normalize_area_code(&d.area)))
        .collect();

    if args.output.json {
        let json = serde_json::to_string_pretty(&DescriptorFile::new(descriptor.clone(), datasets.clone()))
            .map_err(|e| AppError::new(4, format!("Failed to serialize descriptor: {e}")))?;
        println!("{json}");
    } else {
        let areas: Vec<String> = request
            .datasets
            .iter()
            .map(|d| crate::domain::normalize_area_code(&d.area))
            .collect();
        let mut unique: Vec<&str> = Vec::new();
        for a in &areas {
            if !unique.contains(&a.as_str()) {
                unique.push(a);
            }
        }
        print!(
            "{}",
            crate::report::format_run_header("Comparison", &unique, start, end, false)
        );
    }

    print_and_export(&descriptor, &args.output, datasets)
}

fn handle_plot(args: PlotArgs) -> Result<(), AppError> {
    let file = crate::io::read_descriptor_json(&args.descriptor)?;
    if !file.datasets.is_empty() {
        println!("Datasets: {}", file.datasets.join(", "));
    }
    let plot = crate::plot::render_ascii_plot(&file.descriptor, args.width, args.height);
    println!("{plot}");
    Ok(())
}

fn handle_tui(args: TuiArgs, config: &Config) -> Result<(), AppError> {
    let rt = runtime()?;
    crate::tui::run(args, config, &rt)
}

fn chart_options(args: &OutputArgs) -> ChartOptions {
    ChartOptions {
        kind: args.kind,
        show_grid: !args.no_grid,
        fill: args.fill,
        label_style: args.labels,
        ..ChartOptions::default()
    }
}

/// Summary table, plot and exports for a built descriptor. Silent in JSON mode apart from exports.
fn print_and_export(descriptor: &ChartDescriptor, args: &OutputArgs, datasets: Vec<String>) -> Result<(), AppError> {
    if !args.json {
        println!(
            "{}",
            crate::report::format_summary_table(&crate::report::summarize(descriptor))
        );
        if let Some(total) = crate::report::pie_total(descriptor) {
            println!("Total: {total:.2}");
        }
        if !args.no_plot {
            println!(
                "{}",
                crate::plot::render_ascii_plot(descriptor, args.width, args.height)
            );
        }
    }

    if let Some(path) = &args.export_csv {
        crate::io::write_descriptor_csv(path, descriptor)?;
    }
    if let Some(path) = &args.export_json {
        crate::io::write_descriptor_json(path, &DescriptorFile::new(descriptor.clone(), datasets))?;
    }
    Ok(())
}

/// Rewrite argv so `entsoe` defaults to `entsoe tui`.
///
/// Rules:
/// - `entsoe`                      -> `entsoe tui`
/// - `entsoe -m actual-load ...`   -> `entsoe tui -m actual-load ...`
/// - `entsoe --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("tui".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(arg1.as_str(), "-h" | "--help" | "-V" | "--version" | "help");
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "fetch" | "compare" | "plot" | "tui");
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "tui flags".
    if arg1.starts_with('-') {
        argv.insert(1, "tui".to_string());
        return argv;
    }

    // Otherwise, leave as-is.
    argv
}
