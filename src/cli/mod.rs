//! Command-line parsing for the labour-market dashboard.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the pipeline code.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::ConfigOverrides;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "lms", version, about = "UK labour market statistics dashboard (ONS time series)")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Options shared by every subcommand.
#[derive(Debug, Args, Clone, Default)]
pub struct GlobalArgs {
    /// Dashboard config (TOML). Defaults to `LMS_CONFIG`, then the built-in panels.
    #[arg(long, global = true, value_name = "TOML")]
    pub config: Option<PathBuf>,

    /// API root URL (overrides `ONS_API_ROOT`).
    #[arg(long, global = true, value_name = "URL")]
    pub api_root: Option<String>,

    /// Per-request timeout in seconds.
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Fetch series one at a time instead of in parallel.
    #[arg(long, global = true)]
    pub sequential: bool,
}

impl GlobalArgs {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            config_path: self.config.clone(),
            api_root: self.api_root.clone(),
            timeout_secs: self.timeout,
            sequential: self.sequential,
        }
    }
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Launch the interactive TUI.
    Tui,
    /// Fetch panels and print charts, tables and source footers.
    Show(ShowArgs),
    /// List configured panels and their series.
    Panels,
    /// Write one panel's table to CSV.
    Export(ExportArgs),
}

#[derive(Debug, Args, Clone)]
pub struct ShowArgs {
    /// Only show these panels (repeatable). Defaults to all.
    #[arg(short = 'p', long = "panel", value_name = "ID")]
    pub panels: Vec<String>,

    /// Column selection for a panel, e.g. `regions=London,Wales` (repeatable).
    #[arg(short = 's', long = "select", value_name = "PANEL=LABELS", value_parser = parse_select)]
    pub select: Vec<(String, Vec<String>)>,

    /// Print the data table for every panel.
    #[arg(long)]
    pub table: bool,

    /// Disable the terminal chart.
    #[arg(long)]
    pub no_plot: bool,

    /// Chart width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Chart height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,
}

#[derive(Debug, Args, Clone)]
pub struct ExportArgs {
    /// Panel to export.
    #[arg(short = 'p', long = "panel", value_name = "ID")]
    pub panel: String,

    /// Output CSV path.
    #[arg(short = 'o', long = "out", value_name = "CSV")]
    pub out: PathBuf,

    /// Columns to keep, comma-separated. Defaults to all.
    #[arg(short = 's', long = "select", value_name = "LABELS", value_delimiter = ',')]
    pub select: Vec<String>,
}

/// Parse `PANEL=LABEL,LABEL`. An empty label list selects no columns.
pub fn parse_select(raw: &str) -> Result<(String, Vec<String>), String> {
    let (panel, labels) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected PANEL=LABELS, got '{raw}'"))?;
    let panel = panel.trim();
    if panel.is_empty() {
        return Err(format!("missing panel id in '{raw}'"));
    }
    let labels = labels
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    Ok((panel.to_string(), labels))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_select_splits_labels() {
        let (panel, labels) = parse_select("regions=London, Wales ,Yorks & the Humber").unwrap();
        assert_eq!(panel, "regions");
        assert_eq!(labels, vec!["London", "Wales", "Yorks & the Humber"]);

        let (_, none) = parse_select("age-bands=").unwrap();
        assert!(none.is_empty());

        assert!(parse_select("London").is_err());
        assert!(parse_select("=London").is_err());
    }

    #[test]
    fn show_accepts_repeated_selections() {
        let cli = Cli::try_parse_from([
            "lms",
            "show",
            "--select",
            "regions=London",
            "-s",
            "age-bands=50+",
            "--table",
            "--sequential",
        ])
        .unwrap();
        assert!(cli.global.sequential);
        match cli.command {
            Command::Show(args) => {
                assert_eq!(args.select.len(), 2);
                assert!(args.table);
                assert_eq!(args.width, 100);
            }
            other => panic!("expected show, got {other:?}"),
        }
    }

    #[test]
    fn export_splits_comma_selection() {
        let cli = Cli::try_parse_from(["lms", "export", "-p", "regions", "-o", "out.csv", "-s", "London,Wales"]).unwrap();
        match cli.command {
            Command::Export(args) => assert_eq!(args.select, vec!["London", "Wales"]),
            other => panic!("expected export, got {other:?}"),
        }
    }
}
