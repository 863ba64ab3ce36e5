use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::dify::DEFAULT_API_URL;

/// Process-wide configuration, loaded once at startup and injected into the
/// API client. The bearer token comes from the `DIFY_API_KEY` environment
/// variable, falling back to the config file.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Config {
    pub dify_api_key: Option<String>,
    pub api_url: Option<String>,
}

impl Config {
    pub fn new() -> Self {
        Self {
            dify_api_key: None,
            api_url: None,
        }
    }

    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from(&config_path)
    }

    fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&config_content)?;
        Ok(config)
    }

    pub fn api_key(&self) -> Option<String> {
        resolve_key(
            std::env::var("DIFY_API_KEY").ok(),
            self.dify_api_key.as_deref(),
        )
    }

    pub fn api_url(&self) -> String {
        resolve_url(std::env::var("DIFY_API_URL").ok(), self.api_url.as_deref())
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir =
            dirs::config_dir().ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("gogaku").join("config.json"))
    }
}

/// Environment wins over the config file; an empty environment value counts
/// as unset.
fn resolve_key(env_value: Option<String>, file_value: Option<&str>) -> Option<String> {
    env_value
        .filter(|v| !v.is_empty())
        .or_else(|| file_value.map(str::to_string))
}

fn resolve_url(env_value: Option<String>, file_value: Option<&str>) -> String {
    env_value
        .filter(|v| !v.is_empty())
        .or_else(|| file_value.map(str::to_string))
        .unwrap_or_else(|| DEFAULT_API_URL.to_string())
}
