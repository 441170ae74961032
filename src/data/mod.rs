//! Upstream data access.
//!
//! - HTTP transport + `MarketSource` seam (`entsoe`)
//! - market document parsing (`document`)
//! - generation category names (`psr`)
//! - parsed-result cache (`cache`)

pub mod cache;
pub mod document;
pub mod entsoe;
pub mod psr;

pub use cache::{ResultCache, cache_key};
pub use document::{DocumentParser, acknowledgement_reason};
pub use entsoe::{EntsoeClient, MarketSource};
