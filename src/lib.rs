//! `lms-dash` library crate.
//!
//! The binary (`lms`) is a thin wrapper around this library so that:
//!
//! - the fetch/normalize/join pipeline is testable without a terminal or network
//! - CLI and TUI front-ends share one panel pipeline
//! - code stays easy to navigate as the panel list grows

pub mod app;
pub mod cli;
pub mod config;
pub mod data;
pub mod debug;
pub mod domain;
pub mod error;
pub mod io;
pub mod logging;
pub mod plot;
pub mod report;
pub mod store;
pub mod tui;
