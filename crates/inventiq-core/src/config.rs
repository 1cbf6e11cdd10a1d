//! Application configuration management.
//!
//! This module handles loading and saving the application configuration,
//! which includes the backend address and the last email used to log in.
//!
//! Configuration is stored at `~/.config/inventiq/config.json`. The backend
//! address can be overridden with the `INVENTIQ_API_URL` environment variable.

use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::api::DEFAULT_API_URL;

/// Application name used for config/data directory paths
const APP_NAME: &str = "inventiq";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Environment variable overriding the backend address
pub const API_URL_ENV: &str = "INVENTIQ_API_URL";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub api_url: Option<String>,
    pub last_email: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            Ok(serde_json::from_str(&contents)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Backend address: environment first, then the config file, then the default.
    pub fn api_url(&self) -> String {
        Self::resolve_api_url(std::env::var(API_URL_ENV).ok(), self.api_url.as_deref())
    }

    fn resolve_api_url(env: Option<String>, configured: Option<&str>) -> String {
        env.filter(|url| !url.trim().is_empty())
            .or_else(|| configured.filter(|url| !url.trim().is_empty()).map(str::to_string))
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
    }

    /// Directory holding the persisted session
    pub fn data_dir(&self) -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }
}
