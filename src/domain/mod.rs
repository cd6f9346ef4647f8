//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - series keys and reporting frequency (`SeriesIdentity`, `Frequency`)
//! - normalized series (`Observation`, `Series`)
//! - joined tables and panel outputs (`SeriesTable`, `PanelMeta`, `PanelData`)

pub mod types;

pub use types::*;
