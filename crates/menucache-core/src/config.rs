//! Application configuration management.
//!
//! Configuration is stored at `~/.config/menucache/config.json`. A missing
//! file means defaults; `MENUCACHE_API_URL` and `MENUCACHE_OFFLINE` override
//! the file.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::api::client::DEFAULT_REQUEST_TIMEOUT_SECS;
use crate::connectivity::DEFAULT_RECONNECT_WINDOW;

/// Application name used for config/cache directory paths
const APP_NAME: &str = "menucache";

/// Config file name
const CONFIG_FILE: &str = "config.json";

const ENV_API_URL: &str = "MENUCACHE_API_URL";
const ENV_OFFLINE: &str = "MENUCACHE_OFFLINE";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the menu API; `None` serves the cached or sample menu
    pub api_base_url: Option<String>,
    pub request_timeout_secs: u64,
    pub reconnect_window_ms: u64,
    /// Treat the host as offline at startup
    pub start_offline: bool,
    /// Overrides the platform cache directory
    pub cache_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            reconnect_window_ms: DEFAULT_RECONNECT_WINDOW.as_millis() as u64,
            start_offline: false,
            cache_dir: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            serde_json::from_str(&contents)?
        } else {
            Self::default()
        };
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
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

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        if let Some(ref dir) = self.cache_dir {
            return Ok(dir.clone());
        }
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn reconnect_window(&self) -> Duration {
        Duration::from_millis(self.reconnect_window_ms)
    }

    fn apply_env_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(url) = var(ENV_API_URL).filter(|u| !u.trim().is_empty()) {
            self.api_base_url = Some(url);
        }
        if let Some(flag) = var(ENV_OFFLINE) {
            self.start_offline = matches!(flag.trim(), "1" | "true" | "yes");
        }
    }
}
