//! Debug bundle writer for inspecting one panel's inputs and joined table.

use std::fs::{create_dir_all, write};
use std::path::{Path, PathBuf};

use chrono::Local;

use crate::app::pipeline::PanelOutcome;
use crate::config::PanelSpec;
use crate::data::ons::series_url;
use crate::error::AppError;
use crate::report::format_table;

/// Rows of the joined table included in the bundle.
const TABLE_TAIL_ROWS: usize = 24;

pub fn write_debug_bundle(outcome: &PanelOutcome, panel: &PanelSpec, api_root: &str) -> Result<PathBuf, AppError> {
    write_debug_bundle_in(Path::new("debug"), outcome, panel, api_root)
}

pub fn write_debug_bundle_in(
    dir: &Path,
    outcome: &PanelOutcome,
    panel: &PanelSpec,
    api_root: &str,
) -> Result<PathBuf, AppError> {
    create_dir_all(dir).map_err(|e| AppError::new(3, format!("Failed to create debug dir: {e}")))?;

    let ts = Local::now().format("%Y%m%d_%H%M%S");
    let path = dir.join(format!("lms_debug_{}_{ts}.md", outcome.id));

    let mut doc = String::new();
    doc.push_str("# lms debug bundle\n");
    doc.push_str(&format!("- generated: {}\n", Local::now().to_rfc3339()));
    doc.push_str(&format!("- panel: {} ({})\n", outcome.id, outcome.title));
    doc.push_str(&format!("- api_root: {api_root}\n"));

    doc.push_str("\n## Series\n");
    for s in &panel.series {
        doc.push_str(&format!(
            "- {} = {} [{}] {}\n",
            s.label,
            s.identity(),
            s.frequency.display_name(),
            series_url(api_root, &s.identity())
        ));
    }

    match &outcome.result {
        Err(err) => {
            doc.push_str(&format!("\n## Error\n{err}\n"));
        }
        Ok(data) => {
            doc.push_str("\n## Metadata\n");
            doc.push_str(&format!("- sources: {}\n", data.meta.source_text()));
            doc.push_str(&format!("- last_updated: {}\n", data.meta.last_updated_text()));
            for c in &data.meta.columns {
                doc.push_str(&format!(
                    "- {}: source={} updated={}\n",
                    c.label,
                    c.source_dataset.as_deref().unwrap_or("-"),
                    c.last_updated.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string())
                ));
            }

            let mut tail = data.table.clone();
            let skip = tail.len().saturating_sub(TABLE_TAIL_ROWS);
            tail.dates.drain(..skip);
            tail.periods.drain(..skip);
            for c in &mut tail.columns {
                c.values.drain(..skip);
            }
            doc.push_str(&format!(
                "\n## Table (last {} of {} rows)\n```\n",
                tail.len(),
                data.table.len()
            ));
            doc.push_str(&format_table(&tail));
            doc.push_str("```\n");
        }
    }

    write(&path, doc).map_err(|e| AppError::new(3, format!("Failed to write debug file: {e}")))?;
    Ok(path)
}
