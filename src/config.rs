use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use crate::autosave::AutosavePolicy;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct CityNotesConfig {
    pub logging: LoggingConfig,
    pub storage: StorageConfig,
    pub autosave: AutosaveConfig,
    pub catalog: CatalogConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub log_level: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub db_path: String,
    /// Versioned key the saved collection lives under.
    pub collection_key: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AutosaveConfig {
    pub debounce_ms: u64,
    pub saved_floor_ms: u64,
    pub retry_ms: u64,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct CatalogConfig {
    /// Optional JSON file replacing the built-in city list. Empty means built-in.
    pub path: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: "info".into(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        let db_path = default_citynotes_dir()
            .join("citynotes.db")
            .to_string_lossy()
            .into_owned();
        Self {
            db_path,
            collection_key: crate::collection::DEFAULT_COLLECTION_KEY.into(),
        }
    }
}

impl Default for AutosaveConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 1000,
            saved_floor_ms: 500,
            retry_ms: 1000,
        }
    }
}

impl AutosaveConfig {
    pub fn policy(&self) -> AutosavePolicy {
        AutosavePolicy {
            debounce: Duration::from_millis(self.debounce_ms),
            saved_floor: Duration::from_millis(self.saved_floor_ms),
            retry_interval: Duration::from_millis(self.retry_ms),
        }
    }
}

/// Returns `~/.citynotes/`
pub fn default_citynotes_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(".citynotes")
}

/// Returns the default config file path: `~/.citynotes/config.toml`
pub fn default_config_path() -> PathBuf {
    default_citynotes_dir().join("config.toml")
}

impl CityNotesConfig {
    /// Load config from TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            CityNotesConfig::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides (CITYNOTES_DB, CITYNOTES_KEY, CITYNOTES_LOG_LEVEL).
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("CITYNOTES_DB") {
            self.storage.db_path = val;
        }
        if let Ok(val) = std::env::var("CITYNOTES_KEY") {
            self.storage.collection_key = val;
        }
        if let Ok(val) = std::env::var("CITYNOTES_LOG_LEVEL") {
            self.logging.log_level = val;
        }
    }

    /// Resolve the database path, expanding `~` if needed.
    pub fn resolved_db_path(&self) -> PathBuf {
        expand_tilde(&self.storage.db_path)
    }

    /// Custom catalog file, if one is configured.
    pub fn resolved_catalog_path(&self) -> Option<PathBuf> {
        let path = self.catalog.path.trim();
        (!path.is_empty()).then(|| expand_tilde(path))
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}
