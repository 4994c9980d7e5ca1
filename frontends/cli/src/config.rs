use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use tabula::ListConfig;
use tabula_rest::RestConfig;

pub const CONFIG_ENV: &str = "TABULA_CONFIG";
pub const BASE_URL_ENV: &str = "TABULA_BASE_URL";

/// Settings read from `config.yaml`
///
/// ```yaml
/// rest:
///   base_url: http://localhost:3001
///   timeout_ms: 5000
/// list:
///   page_size: 20
///   default_sort_field: name
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub rest: RestConfig,
    pub list: ListConfig,
}

impl CliConfig {
    /// Load the configuration from a YAML file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            anyhow::anyhow!("Failed to read config file {}: {}", path.display(), e)
        })?;

        let config: CliConfig = serde_yaml::from_str(&content).map_err(|e| {
            anyhow::anyhow!("Failed to parse config YAML {}: {}", path.display(), e)
        })?;

        Ok(config)
    }

    /// Config file to use: `explicit`, then `$TABULA_CONFIG`, then
    /// `~/.config/tabula/config.yaml` if it exists
    pub fn locate(explicit: Option<PathBuf>) -> Option<PathBuf> {
        if explicit.is_some() {
            return explicit;
        }
        if let Ok(env_path) = std::env::var(CONFIG_ENV) {
            return Some(PathBuf::from(env_path));
        }
        let home = std::env::var_os("HOME")?;
        let mut default_path = PathBuf::from(home);
        default_path.push(".config");
        default_path.push("tabula");
        default_path.push("config.yaml");
        default_path.exists().then_some(default_path)
    }

    /// Located file (or defaults) with the base URL override applied, validated
    pub fn resolve(explicit: Option<PathBuf>) -> Result<Self> {
        let mut config = match Self::locate(explicit) {
            Some(path) => {
                debug!("Loading config from {}", path.display());
                Self::load_from_file(&path)?
            }
            None => Self::default(),
        };

        if let Ok(base_url) = std::env::var(BASE_URL_ENV) {
            config.rest.base_url = base_url;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.rest.validate()?;
        self.list.validate()?;
        Ok(())
    }
}
