//! Ledger settings
//!
//! ## Configuration Resolution
//!
//! Settings are loaded with a two-layer resolution:
//! 1. An explicit path (`--config`), else the override in the data dir
//!    (~/.local/share/pettycash/config.toml)
//! 2. Fall back to embedded defaults (compiled into binary)
//!
//! Keys missing from an override file keep their default values.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::ingest::ImportLayout;

/// Embedded default settings (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/pettycash.toml");

/// All ledger settings
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub import: ImportLayout,
    pub display: DisplaySettings,
}

/// How query results are presented
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    /// Unit appended to the grand total
    pub currency_unit: String,
    /// Rows previewed before an import is committed
    pub preview_rows: usize,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            currency_unit: "元".to_string(),
            preview_rows: 5,
        }
    }
}

impl Settings {
    /// Load settings from an explicit path, the data-dir override or the
    /// embedded defaults, in that order
    pub fn load(override_path: Option<&Path>) -> Result<Self> {
        if let Some(path) = override_path {
            if !path.exists() {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            return Self::from_file(path);
        }

        match default_config_path() {
            Some(path) if path.exists() => Self::from_file(&path),
            _ => Self::parse(DEFAULT_CONFIG),
        }
    }

    /// Read settings from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading settings from {}", path.display());
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        Self::parse(&content)
    }

    /// Parse settings from TOML content
    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

/// Default settings override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("pettycash").join("config.toml"))
}
