//! `entsoe-charts` library crate.
//!
//! Fetches market documents from the ENTSO-E Transparency Platform, turns them
//! into time series and builds renderer-neutral chart descriptors.
//!
//! The binary (`entsoe`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - the CLI and TUI share one fetch pipeline

pub mod app;
pub mod chart;
pub mod cli;
pub mod config;
pub mod data;
pub mod domain;
pub mod error;
pub mod io;
pub mod plot;
pub mod report;
pub mod series;
pub mod tui;
