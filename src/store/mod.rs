//! Wide-table construction from normalized series.
//!
//! - `join`: date-indexed outer join, one column per series
//! - `project`: restrict a table to a user-selected set of columns

pub mod join;
pub mod project;

pub use join::join;
pub use project::project;
