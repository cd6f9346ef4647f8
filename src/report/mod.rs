//! Reporting utilities: formatted terminal output for panels.

pub mod format;

pub use format::{RenderOptions, format_panel, format_panel_list, format_table};
