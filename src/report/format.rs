//! Formatted terminal output for panels.
//!
//! We keep formatting code in one place so:
//! - the pipeline code stays clean and testable
//! - output changes are localized (important for future snapshot tests)

use crate::app::pipeline::{PanelOutcome, Selection};
use crate::config::DashboardConfig;
use crate::domain::{PanelData, SeriesTable};
use crate::plot::render_ascii_chart;

/// What to render for each panel.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Force the data table for every panel (otherwise per-panel `show_table`).
    pub show_table: bool,
    pub plot: bool,
    pub width: usize,
    pub height: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            show_table: false,
            plot: true,
            width: 100,
            height: 20,
        }
    }
}

/// Format one panel: header, chart, optional table, source footers.
///
/// A failed panel renders its error in place of the chart.
pub fn format_panel(outcome: &PanelOutcome, selection: &Selection, opts: &RenderOptions) -> String {
    let mut out = String::new();
    out.push_str(&format!("=== {} ===\n", outcome.title));

    let data = match &outcome.result {
        Ok(data) => data,
        Err(err) => {
            out.push_str(&format!("error: {err}\n"));
            return out;
        }
    };

    let table = match selection.apply(data) {
        Ok(table) => table,
        Err(err) => {
            out.push_str(&format!("error: {err}\n"));
            return out;
        }
    };

    if opts.plot {
        out.push_str(&render_ascii_chart(&table, opts.width, opts.height, data.unit.as_deref()));
    }

    if opts.show_table || outcome.show_table {
        out.push_str("\nTable\n");
        out.push_str(&format_table(&table));
    }

    out.push_str(&format_footer(data));
    out
}

pub fn format_footer(data: &PanelData) -> String {
    format!(
        "Source: {}\nLast updated: {}\n",
        data.meta.source_text(),
        data.meta.last_updated_text()
    )
}

/// Fixed-width table: date, period, then one column per label.
///
/// Missing cells render as `-`.
pub fn format_table(table: &SeriesTable) -> String {
    let widths: Vec<usize> = table
        .columns
        .iter()
        .map(|c| c.label.chars().count().max(8))
        .collect();

    let mut out = String::new();

    let mut header = format!("{:<10} {:<10}", "date", "period");
    for (c, w) in table.columns.iter().zip(&widths) {
        header.push_str(&format!(" {:>w$}", c.label, w = *w));
    }
    out.push_str(header.trim_end());
    out.push('\n');

    let mut rule = format!("{:-<10} {:-<10}", "", "");
    for w in &widths {
        rule.push_str(&format!(" {:-<w$}", "", w = *w));
    }
    out.push_str(&rule);
    out.push('\n');

    for (row, date) in table.dates.iter().enumerate() {
        let period = table.periods.get(row).map(String::as_str).unwrap_or("");
        let mut line = format!("{:<10} {:<10}", date.to_string(), truncate(period, 10));
        for (c, w) in table.columns.iter().zip(&widths) {
            line.push_str(&format!(" {:>w$}", fmt_cell(c.values[row]), w = *w));
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }

    out
}

/// One line per panel with its series identities.
pub fn format_panel_list(config: &DashboardConfig) -> String {
    let mut out = String::new();
    for panel in &config.panels {
        out.push_str(&format!("{:<14} {}\n", panel.id, panel.provisional_title()));
        for s in &panel.series {
            out.push_str(&format!(
                "{:<14}   {:<20} {} ({})\n",
                "",
                s.label,
                s.identity(),
                s.frequency.display_name()
            ));
        }
    }
    out
}

pub fn fmt_cell(v: Option<f64>) -> String {
    match v {
        Some(v) => format!("{v}"),
        None => "-".to_string(),
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Column, ColumnMeta, PanelMeta, SeriesIdentity};
    use crate::error::PipelineError;
    use chrono::NaiveDate;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn regions() -> PanelData {
        PanelData {
            id: "regions".to_string(),
            title: "Regional unemployment".to_string(),
            unit: Some("%".to_string()),
            table: SeriesTable {
                dates: vec![ymd(2023, 1, 1), ymd(2023, 2, 1)],
                periods: vec!["2023 JAN".to_string(), "2023 FEB".to_string()],
                columns: vec![
                    Column {
                        label: "London".to_string(),
                        values: vec![Some(4.5), None],
                    },
                    Column {
                        label: "Yorks & the Humber".to_string(),
                        values: vec![Some(3.9), Some(4.0)],
                    },
                ],
            },
            meta: PanelMeta::from_columns(vec![ColumnMeta {
                label: "London".to_string(),
                identity: SeriesIdentity::new("LMS", "YCNI"),
                source_dataset: Some("LMS".to_string()),
                last_updated: Some(ymd(2023, 3, 14)),
            }]),
        }
    }

    #[test]
    fn table_marks_missing_cells() {
        let txt = format_table(&regions().table);
        let expected = concat!(
            "date       period       London Yorks & the Humber\n",
            "---------- ---------- -------- ------------------\n",
            "2023-01-01 2023 JAN        4.5                3.9\n",
            "2023-02-01 2023 FEB          -                  4\n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn panel_includes_table_and_footers() {
        let outcome = PanelOutcome {
            id: "regions".to_string(),
            title: "Regional unemployment".to_string(),
            show_table: false,
            result: Ok(regions()),
        };
        let opts = RenderOptions {
            show_table: true,
            plot: false,
            ..RenderOptions::default()
        };
        let txt = format_panel(&outcome, &Selection::default(), &opts);
        assert!(txt.starts_with("=== Regional unemployment ===\n"));
        assert!(txt.contains("\nTable\n"));
        assert!(txt.ends_with("Source: LMS\nLast updated: 2023-03-14\n"));
    }

    #[test]
    fn failed_panel_renders_error_in_place() {
        let outcome = PanelOutcome {
            id: "vacancies".to_string(),
            title: "Vacancies".to_string(),
            show_table: true,
            result: Err(PipelineError::Network {
                identity: SeriesIdentity::new("UNEM", "AP2Y"),
                message: "request failed with status 503 Service Unavailable".to_string(),
            }),
        };
        let txt = format_panel(&outcome, &Selection::default(), &RenderOptions::default());
        assert_eq!(
            txt,
            "=== Vacancies ===\nerror: network error fetching UNEM/AP2Y: request failed with status 503 Service Unavailable\n"
        );
    }

    #[test]
    fn panel_list_shows_identities() {
        let txt = format_panel_list(&DashboardConfig::default());
        assert!(txt.contains("LMS/MGSX (monthly)"));
        assert!(txt.contains("UNEM/AP2Y"));
    }
}
