//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the metric catalog (`MetricKind`)
//! - normalized series shapes (`Point`, `Series`, `MultiSeries`, `MarketData`)
//! - request/result envelopes (`FetchRequest`, `FetchResult`)
//! - the bidding-zone catalog (`area`) and date-range presets (`range`)

pub mod area;
pub mod range;
pub mod types;

pub use area::{Area, DEFAULT_AREA_CODE, KNOWN_AREAS, area_label, normalize_area_code};
pub use range::{DateRange, RangePreset, is_single_day};
pub use types::*;
