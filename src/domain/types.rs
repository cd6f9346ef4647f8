//! Shared domain types.
//!
//! These are plain values: a `Series` is built once per fetch and never
//! mutated, a `SeriesTable` is owned by whoever joined it.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Key of one remote time series: `(datasetId, seriesId)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SeriesIdentity {
    pub dataset_id: String,
    pub series_id: String,
}

impl SeriesIdentity {
    pub fn new(dataset_id: impl Into<String>, series_id: impl Into<String>) -> Self {
        Self {
            dataset_id: dataset_id.into(),
            series_id: series_id.into(),
        }
    }
}

impl fmt::Display for SeriesIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.dataset_id, self.series_id)
    }
}

/// Reporting interval of a series.
///
/// Decides both which observation array is read from the payload and the
/// date grammar used to parse its entries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    #[default]
    Monthly,
    Quarterly,
    Annual,
}

impl Frequency {
    /// Key of the observation array in the API payload.
    pub fn payload_key(self) -> &'static str {
        match self {
            Frequency::Monthly => "months",
            Frequency::Quarterly => "quarters",
            Frequency::Annual => "years",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Frequency::Monthly => "monthly",
            Frequency::Quarterly => "quarterly",
            Frequency::Annual => "annual",
        }
    }
}

/// One normalized data point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// First day of the reporting period.
    pub date: NaiveDate,
    pub value: f64,
    /// Period label as published (e.g. `2023 JAN`).
    pub label: String,
}

/// A fetched and normalized time series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub identity: SeriesIdentity,
    pub frequency: Frequency,
    pub title: String,
    pub unit: Option<String>,
    pub source_dataset: Option<String>,
    pub last_updated: Option<NaiveDate>,
    /// Sorted by date ascending; same-date entries keep document order.
    pub observations: Vec<Observation>,
}

/// One value column of a `SeriesTable`. `None` marks a missing cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub label: String,
    pub values: Vec<Option<f64>>,
}

/// Date-indexed wide table, one column per joined series.
///
/// Invariants:
/// - `dates` is strictly ascending
/// - `periods.len() == dates.len()`
/// - every column has exactly `dates.len()` values
/// - column labels are unique
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeriesTable {
    pub dates: Vec<NaiveDate>,
    pub periods: Vec<String>,
    pub columns: Vec<Column>,
}

impl SeriesTable {
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn labels(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.label.as_str()).collect()
    }

    pub fn column(&self, label: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.label == label)
    }

    /// Finite min/max over every cell, or `None` for an all-missing table.
    pub fn value_bounds(&self) -> Option<(f64, f64)> {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for v in self.columns.iter().flat_map(|c| c.values.iter().flatten()) {
            if v.is_finite() {
                min = min.min(*v);
                max = max.max(*v);
            }
        }
        if min.is_finite() && max.is_finite() {
            Some((min, max))
        } else {
            None
        }
    }
}

/// Footer metadata for one column of a panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnMeta {
    pub label: String,
    pub identity: SeriesIdentity,
    pub source_dataset: Option<String>,
    pub last_updated: Option<NaiveDate>,
}

/// Footer metadata for a panel, derived only from its own constituents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PanelMeta {
    /// Distinct source datasets in constituent order.
    pub sources: Vec<String>,
    /// Latest update date across constituents.
    pub last_updated: Option<NaiveDate>,
    pub columns: Vec<ColumnMeta>,
}

impl PanelMeta {
    pub fn from_columns(columns: Vec<ColumnMeta>) -> Self {
        let mut sources: Vec<String> = Vec::new();
        for c in &columns {
            if let Some(src) = &c.source_dataset {
                if !sources.contains(src) {
                    sources.push(src.clone());
                }
            }
        }
        let last_updated = columns.iter().filter_map(|c| c.last_updated).max();
        Self {
            sources,
            last_updated,
            columns,
        }
    }

    pub fn source_text(&self) -> String {
        if self.sources.is_empty() {
            "-".to_string()
        } else {
            self.sources.join(", ")
        }
    }

    pub fn last_updated_text(&self) -> String {
        self.last_updated
            .map(|d| d.to_string())
            .unwrap_or_else(|| "-".to_string())
    }
}

/// A fully built panel, ready for presentation.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelData {
    pub id: String,
    pub title: String,
    pub unit: Option<String>,
    pub table: SeriesTable,
    pub meta: PanelMeta,
}

/// Chart x-coordinate for a date: months since year 0, with the day as a fraction.
pub fn date_ordinal(date: NaiveDate) -> f64 {
    use chrono::Datelike;
    date.year() as f64 * 12.0 + date.month0() as f64 + (date.day0() as f64 / 31.0)
}

/// Inverse of `date_ordinal`, truncated to the month.
pub fn ordinal_month(x: f64) -> Option<NaiveDate> {
    if !x.is_finite() {
        return None;
    }
    let months = x.floor() as i64;
    let year = months.div_euclid(12) as i32;
    let month = months.rem_euclid(12) as u32 + 1;
    NaiveDate::from_ymd_opt(year, month, 1)
}
