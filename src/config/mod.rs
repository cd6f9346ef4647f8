//! Dashboard configuration.
//!
//! Resolution order (later wins):
//!
//! 1. built-in defaults (the labour-market panel table)
//! 2. a TOML file (`--config PATH` or `LMS_CONFIG`)
//! 3. environment (`ONS_API_ROOT`, `LMS_TIMEOUT_SECS`; `.env` is honored)
//! 4. CLI flags
//!
//! Panels are data, not code: adding a series means adding a `[[panels]]`
//! entry, never another copy of the fetch/normalize block.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::data::ons::{DEFAULT_API_ROOT, DEFAULT_TIMEOUT_SECS};
use crate::domain::{Frequency, SeriesIdentity};
use crate::error::{AppError, PipelineError};

mod panels;

pub use panels::default_panels;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DashboardConfig {
    pub api_root: String,
    /// Per-request timeout.
    pub timeout_secs: u64,
    /// Fetch a panel's series concurrently.
    pub parallel_fetch: bool,
    pub panels: Vec<PanelSpec>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            api_root: DEFAULT_API_ROOT.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            parallel_fetch: true,
            panels: default_panels(),
        }
    }
}

/// One dashboard section: one or more series joined on date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PanelSpec {
    pub id: String,
    /// Falls back to the series title for single-series panels.
    #[serde(default)]
    pub title: Option<String>,
    /// Initial state of the "show table" toggle.
    #[serde(default)]
    pub show_table: bool,
    pub series: Vec<SeriesSpec>,
}

impl PanelSpec {
    pub fn labels(&self) -> Vec<&str> {
        self.series.iter().map(|s| s.label.as_str()).collect()
    }

    /// Title to show before any data has been fetched.
    pub fn provisional_title(&self) -> String {
        self.title.clone().unwrap_or_else(|| match self.series.as_slice() {
            [only] => only.label.clone(),
            _ => self.id.clone(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeriesSpec {
    pub dataset: String,
    pub series: String,
    /// Column label in the joined table.
    pub label: String,
    #[serde(default)]
    pub frequency: Frequency,
}

impl SeriesSpec {
    pub fn identity(&self) -> SeriesIdentity {
        SeriesIdentity::new(self.dataset.clone(), self.series.clone())
    }
}

/// Values supplied on the command line.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub config_path: Option<PathBuf>,
    pub api_root: Option<String>,
    pub timeout_secs: Option<u64>,
    pub sequential: bool,
}

impl DashboardConfig {
    /// Resolve defaults, file, environment and CLI overrides, then validate.
    pub fn load(overrides: &ConfigOverrides) -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let path = overrides
            .config_path
            .clone()
            .or_else(|| std::env::var_os("LMS_CONFIG").map(PathBuf::from));

        let mut config = match path {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };

        if let Ok(root) = std::env::var("ONS_API_ROOT") {
            if !root.trim().is_empty() {
                config.api_root = root.trim().to_string();
            }
        }
        if let Ok(raw) = std::env::var("LMS_TIMEOUT_SECS") {
            config.timeout_secs = raw
                .trim()
                .parse()
                .map_err(|_| AppError::new(2, format!("Invalid LMS_TIMEOUT_SECS '{raw}'.")))?;
        }

        if let Some(root) = &overrides.api_root {
            config.api_root = root.clone();
        }
        if let Some(secs) = overrides.timeout_secs {
            config.timeout_secs = secs;
        }
        if overrides.sequential {
            config.parallel_fetch = false;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, AppError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| AppError::new(2, format!("Failed to read config '{}': {e}", path.display())))?;
        Self::from_toml_str(&text)
            .map_err(|e| AppError::new(2, format!("Config '{}': {e}", path.display())))
    }

    pub fn from_toml_str(text: &str) -> Result<Self, AppError> {
        toml::from_str(text).map_err(|e| AppError::new(2, format!("Invalid config: {e}")))
    }

    /// Reject configurations that could only fail later, at render time.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.api_root.trim().is_empty() {
            return Err(AppError::new(2, "api_root must not be empty."));
        }
        if self.timeout_secs == 0 {
            return Err(AppError::new(2, "timeout_secs must be positive."));
        }

        let mut ids = HashSet::new();
        for panel in &self.panels {
            if panel.id.trim().is_empty() {
                return Err(AppError::new(2, "Panel id must not be empty."));
            }
            if !ids.insert(panel.id.as_str()) {
                return Err(AppError::new(2, format!("Duplicate panel id '{}'.", panel.id)));
            }
            if panel.series.is_empty() {
                return Err(AppError::new(2, format!("Panel '{}' has no series.", panel.id)));
            }
            let mut labels = HashSet::new();
            for s in &panel.series {
                if !labels.insert(s.label.as_str()) {
                    let err = PipelineError::DuplicateColumn {
                        label: s.label.clone(),
                    };
                    return Err(AppError::new(2, format!("Panel '{}': {err}", panel.id)));
                }
            }
        }
        Ok(())
    }

    pub fn panel(&self, id: &str) -> Option<&PanelSpec> {
        self.panels.iter().find(|p| p.id == id)
    }
}
