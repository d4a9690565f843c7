//! Configuration - 設定ファイル
//!
//! A small JSON file; every field is optional.
//!
//! | Field | Default |
//! |-------|---------|
//! | `tick_interval_secs` | 60 |
//! | `data_dir` | `dirs::data_dir()/petdo` |
//! | `companion.name` | "Helper" |
//! | `companion.species` | cat |
//!
//! `PETDO_DATA_DIR` overrides `data_dir` regardless of the file.

use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::app::companion::CompanionDefaults;

pub const DATA_DIR_ENV: &str = "PETDO_DATA_DIR";
pub const DEFAULT_TICK_INTERVAL_SECS: u64 = 60;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    pub tick_interval_secs: u64,
    pub data_dir: PathBuf,
    pub companion: CompanionDefaults,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            tick_interval_secs: DEFAULT_TICK_INTERVAL_SECS,
            data_dir: default_data_dir(),
            companion: CompanionDefaults::default(),
        }
    }
}

impl TrackerConfig {
    /// Read `path` (missing file means defaults) and apply `PETDO_DATA_DIR`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        Ok(Self::load_file(path)?.with_data_dir_override(std::env::var_os(DATA_DIR_ENV)))
    }

    /// Read `path` without looking at the environment.
    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file; using defaults");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Replace `data_dir` when an override is present and non-empty.
    pub fn with_data_dir_override(mut self, value: Option<OsString>) -> Self {
        if let Some(dir) = value.filter(|v| !v.is_empty()) {
            self.data_dir = PathBuf::from(dir);
        }
        self
    }

    /// Never zero: a zero interval would spin the runtime.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval_secs.max(1))
    }
}

/// `dirs::data_dir()/petdo`, or `petdo-data` where the platform has none.
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("petdo"))
        .unwrap_or_else(|| PathBuf::from("petdo-data"))
}

/// `dirs::config_dir()/petdo/config.json`.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("petdo"))
        .unwrap_or_else(|| PathBuf::from("."))
        .join("config.json")
}
