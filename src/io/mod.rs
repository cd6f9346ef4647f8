//! Input/output helpers.
//!
//! - table exports (CSV) (`export`)

pub mod export;

pub use export::*;
