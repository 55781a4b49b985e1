use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ClientError, Result};

/// Client configuration. Immutable once a client is built from it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the PLATE-VS web services
    pub base_url: String,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// Directory downloaded files are written to (created if absent)
    pub output_dir: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.drugbench.org".to_string(),
            timeout_secs: 30,
            output_dir: PathBuf::from("./platevs_data"),
        }
    }
}

impl ClientConfig {
    /// Load config from the default location, falling back to defaults
    /// when no file exists yet.
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;

        if !config_path.exists() {
            return Ok(Self::default());
        }

        Self::load_from(&config_path)
    }

    /// Load config from an explicit TOML file
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|e| ClientError::Config(format!("failed to read {}: {e}", path.display())))?;
        toml::from_str(&contents)
            .map_err(|e| ClientError::Config(format!("failed to parse {}: {e}", path.display())))
    }

    /// Save config to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    /// Save config to an explicit TOML file, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| ClientError::Config(format!("failed to create config dir: {e}")))?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| ClientError::Config(format!("failed to serialize config: {e}")))?;
        fs::write(path, contents)
            .map_err(|e| ClientError::Config(format!("failed to write {}: {e}", path.display())))?;

        Ok(())
    }

    /// Get the default config file path
    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| ClientError::Config("could not determine config directory".into()))?;

        Ok(config_dir.join("platevs").join("config.toml"))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
