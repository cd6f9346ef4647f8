//! Date-indexed outer join of normalized series.
//!
//! The wide table is built as a left fold of pairwise outer joins, in input
//! order, so column order follows the caller's list. Every date seen in any
//! input becomes a row; a series without that date contributes `None`.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::NaiveDate;
use tracing::debug;

use crate::domain::{Column, Series, SeriesTable};
use crate::error::PipelineError;

impl SeriesTable {
    /// Single-column table holding `series` under `label`.
    ///
    /// Repeated dates collapse to their last occurrence.
    pub fn from_series(series: &Series, label: &str) -> Self {
        let mut rows: BTreeMap<NaiveDate, (&str, f64)> = BTreeMap::new();
        for obs in &series.observations {
            rows.insert(obs.date, (obs.label.as_str(), obs.value));
        }

        let mut dates = Vec::with_capacity(rows.len());
        let mut periods = Vec::with_capacity(rows.len());
        let mut values = Vec::with_capacity(rows.len());
        for (date, (period, value)) in rows {
            dates.push(date);
            periods.push(period.to_string());
            values.push(Some(value));
        }

        SeriesTable {
            dates,
            periods,
            columns: vec![Column {
                label: label.to_string(),
                values,
            }],
        }
    }

    /// Pairwise outer join on the date index.
    ///
    /// Columns of `self` come first. Period labels prefer `self`'s row.
    pub fn outer_join(self, other: SeriesTable) -> Result<SeriesTable, PipelineError> {
        for c in &other.columns {
            if self.column(&c.label).is_some() {
                return Err(PipelineError::DuplicateColumn {
                    label: c.label.clone(),
                });
            }
        }

        // (date, row in self, row in other)
        let mut rows: Vec<(NaiveDate, Option<usize>, Option<usize>)> =
            Vec::with_capacity(self.dates.len().max(other.dates.len()));
        let (mut i, mut j) = (0usize, 0usize);
        loop {
            let order = match (self.dates.get(i), other.dates.get(j)) {
                (Some(a), Some(b)) => a.cmp(b),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => break,
            };
            match order {
                Ordering::Less => {
                    rows.push((self.dates[i], Some(i), None));
                    i += 1;
                }
                Ordering::Greater => {
                    rows.push((other.dates[j], None, Some(j)));
                    j += 1;
                }
                Ordering::Equal => {
                    rows.push((self.dates[i], Some(i), Some(j)));
                    i += 1;
                    j += 1;
                }
            }
        }

        let dates = rows.iter().map(|r| r.0).collect();
        let periods = rows
            .iter()
            .map(|&(_, li, ri)| match (li, ri) {
                (Some(li), _) => self.periods[li].clone(),
                (None, Some(ri)) => other.periods[ri].clone(),
                (None, None) => String::new(),
            })
            .collect();

        let mut columns = Vec::with_capacity(self.columns.len() + other.columns.len());
        for c in self.columns {
            let values = rows.iter().map(|&(_, li, _)| li.and_then(|k| c.values[k])).collect();
            columns.push(Column { label: c.label, values });
        }
        for c in other.columns {
            let values = rows.iter().map(|&(_, _, ri)| ri.and_then(|k| c.values[k])).collect();
            columns.push(Column { label: c.label, values });
        }

        Ok(SeriesTable {
            dates,
            periods,
            columns,
        })
    }
}

/// Join `(series, column label)` pairs into one wide table.
///
/// Labels must be unique across the inputs; a repeat is a `DuplicateColumn`
/// error rather than a silently suffixed column.
pub fn join<'a, I>(inputs: I) -> Result<SeriesTable, PipelineError>
where
    I: IntoIterator<Item = (&'a Series, &'a str)>,
{
    let table = inputs
        .into_iter()
        .try_fold(SeriesTable::default(), |acc, (series, label)| {
            acc.outer_join(SeriesTable::from_series(series, label))
        })?;
    debug!(rows = table.len(), columns = table.columns.len(), "joined series");
    Ok(table)
}
