//! Shared panel pipeline used by both CLI and TUI front-ends.
//!
//! fetch (all constituents) -> normalize -> join -> panel metadata
//!
//! Every panel is built independently: one panel's failure is recorded in its
//! `PanelOutcome` and never stops the others. Within a panel nothing is joined
//! until every constituent fetch has succeeded, so a failed series can never
//! silently drop out of a chart.

use std::collections::HashMap;

use rayon::prelude::*;
use tracing::{info, warn};

use crate::config::{DashboardConfig, PanelSpec, SeriesSpec};
use crate::data::{RawPayload, SeriesSource, normalize};
use crate::domain::{ColumnMeta, PanelData, PanelMeta, Series, SeriesTable};
use crate::error::PipelineError;
use crate::store::{join, project};

/// Result of building one configured panel.
#[derive(Debug, Clone)]
pub struct PanelOutcome {
    pub id: String,
    pub title: String,
    pub show_table: bool,
    pub result: Result<PanelData, PipelineError>,
}

impl PanelOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Fetch every constituent of a panel; fails on the first error in panel order.
pub fn fetch_payloads(
    source: &dyn SeriesSource,
    panel: &PanelSpec,
    parallel: bool,
) -> Result<Vec<RawPayload>, PipelineError> {
    let fetch_one = |spec: &SeriesSpec| source.fetch(&spec.identity(), spec.frequency);
    if parallel && panel.series.len() > 1 {
        panel.series.par_iter().map(fetch_one).collect()
    } else {
        panel.series.iter().map(fetch_one).collect()
    }
}

/// Build one panel: fetch, normalize, join, derive footer metadata.
pub fn build_panel(
    source: &dyn SeriesSource,
    panel: &PanelSpec,
    parallel: bool,
) -> Result<PanelData, PipelineError> {
    let payloads = fetch_payloads(source, panel, parallel)?;
    let series: Vec<Series> = payloads.iter().map(normalize).collect::<Result<_, _>>()?;

    let table = join(
        series
            .iter()
            .zip(&panel.series)
            .map(|(s, spec)| (s, spec.label.as_str())),
    )?;

    let meta = PanelMeta::from_columns(
        series
            .iter()
            .zip(&panel.series)
            .map(|(s, spec)| ColumnMeta {
                label: spec.label.clone(),
                identity: s.identity.clone(),
                source_dataset: s.source_dataset.clone(),
                last_updated: s.last_updated,
            })
            .collect(),
    );

    let title = match (&panel.title, series.as_slice()) {
        (Some(title), _) => title.clone(),
        (None, [only]) => only.title.clone(),
        (None, _) => panel.id.clone(),
    };

    // A unit is only shown when every constituent agrees on it.
    let unit = series.first().and_then(|first| {
        let unit = first.unit.clone()?;
        series
            .iter()
            .all(|s| s.unit.as_deref() == Some(unit.as_str()))
            .then_some(unit)
    });

    info!(panel = %panel.id, rows = table.len(), columns = table.columns.len(), "built panel");

    Ok(PanelData {
        id: panel.id.clone(),
        title,
        unit,
        table,
        meta,
    })
}

/// Build every configured panel, isolating failures per panel.
pub fn build_dashboard(source: &dyn SeriesSource, config: &DashboardConfig) -> Vec<PanelOutcome> {
    config
        .panels
        .iter()
        .map(|panel| build_outcome(source, panel, config.parallel_fetch))
        .collect()
}

pub fn build_outcome(source: &dyn SeriesSource, panel: &PanelSpec, parallel: bool) -> PanelOutcome {
    let result = build_panel(source, panel, parallel);
    if let Err(err) = &result {
        warn!(panel = %panel.id, error = %err, "panel failed");
    }
    let title = match &result {
        Ok(data) => data.title.clone(),
        Err(_) => panel.provisional_title(),
    };
    PanelOutcome {
        id: panel.id.clone(),
        title,
        show_table: panel.show_table,
        result,
    }
}

/// Per-panel column selection (the multi-select UI state).
///
/// Panels without an entry show every column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    by_panel: HashMap<String, Vec<String>>,
}

impl Selection {
    pub fn from_pairs(pairs: impl IntoIterator<Item = (String, Vec<String>)>) -> Self {
        let mut selection = Self::default();
        for (panel, labels) in pairs {
            selection.set(&panel, labels);
        }
        selection
    }

    pub fn set(&mut self, panel: &str, labels: Vec<String>) {
        self.by_panel.insert(panel.to_string(), labels);
    }

    pub fn clear(&mut self, panel: &str) {
        self.by_panel.remove(panel);
    }

    pub fn get(&self, panel: &str) -> Option<&[String]> {
        self.by_panel.get(panel).map(Vec::as_slice)
    }

    /// The panel's table restricted to the selected columns.
    pub fn apply(&self, panel: &PanelData) -> Result<SeriesTable, PipelineError> {
        match self.get(&panel.id) {
            Some(labels) => project(&panel.table, labels),
            None => Ok(panel.table.clone()),
        }
    }
}
