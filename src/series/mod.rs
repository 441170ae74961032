//! Time-axis logic: timestamp reconstruction and multi-series alignment.

pub mod align;
pub mod clock;

pub use align::{AlignedSeries, align, collapse_total};
pub use clock::{ResolutionClock, parse_resolution_minutes, parse_utc_instant, resolve};
