//! Input/output helpers.
//!
//! - chart data exports (CSV) and fetch result JSON (`export`)
//! - descriptor JSON read/write (`descriptor`)

pub mod descriptor;
pub mod export;

pub use descriptor::*;
pub use export::*;
