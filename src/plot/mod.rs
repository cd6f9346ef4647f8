//! Terminal plotting (plain text, no terminal control).

pub mod ascii;

pub use ascii::render_ascii_chart;
