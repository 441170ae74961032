//! Terminal (ASCII) rendering of chart descriptors.

pub mod ascii;

pub use ascii::*;
