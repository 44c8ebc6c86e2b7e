//! Configuration system for querycanvas.
//!
//! Supports TOML-based configuration for editor defaults, validation feedback
//! and the on-disk store location.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{QueryCanvasError, Result};

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct QueryCanvasConfig {
    /// Defaults applied to every new editing session.
    pub editor: EditorConfig,
    pub validation: ValidationConfig,
    pub storage: StorageConfig,
}

/// Editing session defaults.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Wrap identifiers in double quotes (default: false).
    pub use_quotes: bool,
    /// Number of OR filter groups shown for new queries (1-3, default: 1).
    pub filter_group_count: usize,
    /// Start new queries with grouping enabled (default: false).
    pub group_by_active: bool,
}

/// Validation feedback configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// How long a transient error banner stays visible, in milliseconds (default: 3000).
    pub error_banner_ms: u64,
}

/// Persistence configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory for the file store. Falls back to the user data dir when unset.
    pub dir: Option<PathBuf>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            use_quotes: false,
            filter_group_count: 1,
            group_by_active: false,
        }
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            error_banner_ms: 3_000,
        }
    }
}

impl ValidationConfig {
    pub fn error_banner_ttl(&self) -> Duration {
        Duration::from_millis(self.error_banner_ms)
    }
}

impl StorageConfig {
    /// Resolve the store directory: explicit `dir`, else `<data_dir>/querycanvas`.
    pub fn resolve_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.dir {
            return Ok(dir.clone());
        }
        dirs::data_dir()
            .map(|d| d.join("querycanvas"))
            .ok_or_else(|| QueryCanvasError::Config("no user data directory available".into()))
    }
}

impl QueryCanvasConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| QueryCanvasError::Config(format!("failed to read config file: {e}")))?;
        Self::from_toml(&contents)
    }

    /// Load configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str)
            .map_err(|e| QueryCanvasError::Config(format!("failed to parse config: {e}")))
    }

    /// Load from default locations (env var, cwd, user config dir, or defaults).
    ///
    /// Search order:
    /// 1. `QUERYCANVAS_CONFIG` environment variable
    /// 2. `./querycanvas.toml` (current directory)
    /// 3. `~/.config/querycanvas/config.toml` (user config dir)
    /// 4. Built-in defaults
    pub fn load_default() -> Self {
        if let Ok(path) = std::env::var("QUERYCANVAS_CONFIG") {
            if let Ok(cfg) = Self::from_file(&path) {
                tracing::info!(path = %path, "loaded config from QUERYCANVAS_CONFIG");
                return cfg;
            }
        }

        if let Ok(cfg) = Self::from_file("querycanvas.toml") {
            tracing::info!("loaded config from ./querycanvas.toml");
            return cfg;
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("querycanvas").join("config.toml");
            if let Ok(cfg) = Self::from_file(&user_config) {
                tracing::info!(path = %user_config.display(), "loaded config from user config dir");
                return cfg;
            }
        }

        tracing::debug!("no config file found, using defaults");
        Self::default()
    }
}
