//! Application settings file handling.
//!
//! An optional `config.toml` under the platform config directory provides
//! defaults (database location, preferred interface) that CLI flags and
//! environment variables override. A missing or malformed file never blocks
//! startup.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::warn;

use crate::store::DEFAULT_DB_FILE;

/// Directory name under the platform config/data dirs.
const APP_DIR: &str = "petlink";

/// Operator-editable settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Database file location.
    pub db_path: Option<PathBuf>,
    /// Interface preselected for registration and sending.
    pub default_interface: Option<String>,
}

impl AppConfig {
    /// Platform location of the settings file.
    pub fn config_file() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join("config.toml"))
    }

    /// Loads settings from the platform location.
    pub fn load() -> Self {
        match Self::config_file() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Loads settings from an explicit path. Missing file or parse errors
    /// fall back to defaults with a logged warning.
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => config,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Malformed config file, using defaults");
                    Self::default()
                }
            },
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Unreadable config file, using defaults");
                Self::default()
            }
        }
    }

    /// Database path resolution: CLI flag, then config file, then the
    /// platform data directory, then the working directory.
    pub fn resolve_db_path(&self, cli_override: Option<&Path>) -> PathBuf {
        if let Some(path) = cli_override {
            return path.to_path_buf();
        }
        if let Some(path) = &self.db_path {
            return path.clone();
        }
        dirs::data_dir().map_or_else(
            || PathBuf::from(DEFAULT_DB_FILE),
            |dir| dir.join(APP_DIR).join(DEFAULT_DB_FILE),
        )
    }
}
