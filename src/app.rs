//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and resolves the dashboard config
//! - installs logging
//! - builds panels through the shared pipeline
//! - prints panels or writes exports

use clap::Parser;
use tracing::info;

use crate::cli::{Command, ExportArgs, ShowArgs};
use crate::config::{ConfigOverrides, DashboardConfig};
use crate::data::{CachedSource, OnsClient};
use crate::error::AppError;
use crate::logging::{LogSink, tui_log_path};
use crate::report::RenderOptions;

pub mod pipeline;

use pipeline::{Selection, build_dashboard, build_outcome};

/// Entry point for the `lms` binary.
pub fn run() -> Result<(), AppError> {
    // We want `lms` and `lms --sequential` to behave like `lms tui ...`.
    //
    // Clap requires a subcommand name, so we do a small, explicit rewrite of the
    // argv list before parsing.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);
    let overrides = cli.global.overrides();

    match cli.command {
        Command::Show(args) => handle_show(args, &overrides),
        Command::Panels => handle_panels(&overrides),
        Command::Export(args) => handle_export(args, &overrides),
        Command::Tui => handle_tui(&overrides),
    }
}

fn handle_show(args: ShowArgs, overrides: &ConfigOverrides) -> Result<(), AppError> {
    crate::logging::init(LogSink::Stderr)?;
    let mut config = DashboardConfig::load(overrides)?;

    for (panel, _) in &args.select {
        require_panel(&config, panel)?;
    }
    if !args.panels.is_empty() {
        for id in &args.panels {
            require_panel(&config, id)?;
        }
        config.panels.retain(|p| args.panels.contains(&p.id));
    }

    let selection = Selection::from_pairs(args.select.clone());
    let opts = RenderOptions {
        show_table: args.table,
        plot: !args.no_plot,
        width: args.width,
        height: args.height,
    };

    let source = CachedSource::new(OnsClient::from_config(&config)?);
    let outcomes = build_dashboard(&source, &config);

    for outcome in &outcomes {
        println!("{}", crate::report::format_panel(outcome, &selection, &opts));
    }

    let failed = outcomes
        .iter()
        .filter(|o| !o.is_ok() || o.result.as_ref().is_ok_and(|d| selection.apply(d).is_err()))
        .count();
    info!(panels = outcomes.len(), failed, "dashboard rendered");
    if failed > 0 {
        return Err(AppError::new(
            4,
            format!("{failed} of {} panels failed.", outcomes.len()),
        ));
    }
    Ok(())
}

fn handle_panels(overrides: &ConfigOverrides) -> Result<(), AppError> {
    crate::logging::init(LogSink::Stderr)?;
    let config = DashboardConfig::load(overrides)?;
    print!("{}", crate::report::format_panel_list(&config));
    Ok(())
}

fn handle_export(args: ExportArgs, overrides: &ConfigOverrides) -> Result<(), AppError> {
    crate::logging::init(LogSink::Stderr)?;
    let config = DashboardConfig::load(overrides)?;
    let panel = require_panel(&config, &args.panel)?;

    let source = CachedSource::new(OnsClient::from_config(&config)?);
    let data = build_outcome(&source, panel, config.parallel_fetch).result?;

    let mut selection = Selection::default();
    if !args.select.is_empty() {
        selection.set(&panel.id, args.select.clone());
    }
    let table = selection.apply(&data)?;

    crate::io::export::write_table_csv(&args.out, &table)?;
    info!(panel = %panel.id, rows = table.len(), path = %args.out.display(), "exported table");
    Ok(())
}

fn handle_tui(overrides: &ConfigOverrides) -> Result<(), AppError> {
    crate::logging::init(LogSink::File(tui_log_path()))?;
    let config = DashboardConfig::load(overrides)?;
    crate::tui::run(config)
}

fn require_panel<'a>(
    config: &'a DashboardConfig,
    id: &str,
) -> Result<&'a crate::config::PanelSpec, AppError> {
    config.panel(id).ok_or_else(|| {
        let known: Vec<&str> = config.panels.iter().map(|p| p.id.as_str()).collect();
        AppError::new(
            2,
            format!("Unknown panel '{id}'. Known panels: {}.", known.join(", ")),
        )
    })
}

/// Rewrite argv so `lms` defaults to `lms tui`.
///
/// Rules:
/// - `lms`                       -> `lms tui`
/// - `lms --sequential ...`      -> `lms tui --sequential ...`
/// - `lms --help/--version/-h`   -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("tui".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "show" | "panels" | "export" | "tui");
    if is_subcommand {
        return argv;
    }

    // Global flags may come before the subcommand.
    if arg1.starts_with('-') {
        let has_subcommand = argv
            .iter()
            .skip(1)
            .any(|a| matches!(a.as_str(), "show" | "panels" | "export" | "tui"));
        if !has_subcommand {
            argv.push("tui".to_string());
        }
        return argv;
    }

    argv
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bare_invocation_launches_tui() {
        assert_eq!(rewrite_args(args(&["lms"])), args(&["lms", "tui"]));
    }

    #[test]
    fn flags_only_launch_tui() {
        assert_eq!(
            rewrite_args(args(&["lms", "--timeout", "5"])),
            args(&["lms", "--timeout", "5", "tui"])
        );
    }

    #[test]
    fn global_flags_before_subcommand_are_kept() {
        let argv = args(&["lms", "--sequential", "show", "--table"]);
        assert_eq!(rewrite_args(argv.clone()), argv);
    }

    #[test]
    fn subcommands_and_help_pass_through() {
        for list in [&["lms", "show"][..], &["lms", "panels"], &["lms", "--help"], &["lms", "-V"]] {
            let argv = args(list);
            assert_eq!(rewrite_args(argv.clone()), argv);
        }
    }

    #[test]
    fn unknown_panel_is_a_usage_error() {
        let config = DashboardConfig::default();
        let err = require_panel(&config, "wages").unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("regions"));
    }
}
