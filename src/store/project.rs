//! Column projection for user selections.

use crate::domain::{Column, SeriesTable};
use crate::error::PipelineError;

/// Restrict `table` to the `selected` columns, in the caller's order.
///
/// All rows are kept, including rows where every selected column is missing.
/// Repeated labels in `selected` are ignored after their first occurrence.
pub fn project<S: AsRef<str>>(table: &SeriesTable, selected: &[S]) -> Result<SeriesTable, PipelineError> {
    let mut columns: Vec<Column> = Vec::with_capacity(selected.len());
    for label in selected {
        let label = label.as_ref();
        if columns.iter().any(|c| c.label == label) {
            continue;
        }
        let column = table.column(label).ok_or_else(|| PipelineError::UnknownColumn {
            label: label.to_string(),
        })?;
        columns.push(column.clone());
    }

    Ok(SeriesTable {
        dates: table.dates.clone(),
        periods: table.periods.clone(),
        columns,
    })
}
