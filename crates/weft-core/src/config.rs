//! Browser configuration

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use weft_navigation::DEFAULT_MAX_ENTRY_COUNT;
use weft_tabs::TabSettings;

use crate::error::CoreError;
use crate::Result;

/// Shell settings. Missing fields in a config file take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path to the database file
    pub database_path: PathBuf,
    /// Run every tab in an off-the-record profile
    pub incognito: bool,
    /// Link-doctor service used for network error pages
    pub alternate_error_page_base: Option<Url>,
    /// `tracing` filter used when `RUST_LOG` is not set
    pub log_filter: String,
    pub max_entry_count: usize,
}

impl Config {
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            database_path: data_dir.join("weft.db"),
            incognito: false,
            alternate_error_page_base: None,
            log_filter: "info".to_string(),
            max_entry_count: DEFAULT_MAX_ENTRY_COUNT,
        }
    }

    pub fn data_dir() -> PathBuf {
        dirs::data_local_dir()
            .map(|d| d.join("Weft"))
            .unwrap_or_else(|| PathBuf::from(".weft"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&contents)?;
        if config.max_entry_count == 0 {
            return Err(CoreError::Config(
                "max_entry_count must be at least 1".to_string(),
            ));
        }
        tracing::info!(path = %path.display(), "Configuration loaded");
        Ok(config)
    }

    /// Loads `path` if it exists, otherwise returns the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!(path = %path.display(), "No configuration file, using defaults");
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn tab_settings(&self) -> TabSettings {
        TabSettings {
            alternate_error_page_base: self.alternate_error_page_base.clone(),
            max_entry_count: self.max_entry_count,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(Self::data_dir())
    }
}
