//! Application configuration management.
//!
//! This module handles loading and saving the console configuration: the API
//! base URL, request timeout, cache freshness window, refresh policy and the
//! last used login email.
//!
//! Configuration is stored at `~/.config/quizadmin/config.json`. The
//! `QUIZADMIN_API_URL` environment variable overrides the stored base URL.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Application name used for config/cache directory paths
const APP_NAME: &str = "quizadmin";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Environment variable that overrides `api_base_url`
pub const API_URL_ENV: &str = "QUIZADMIN_API_URL";

const DEFAULT_API_BASE_URL: &str = "http://localhost:8080";

/// 30s allows for slow API responses while failing fast enough for good UX.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

const DEFAULT_CACHE_STALE_MINUTES: i64 = crate::cache::DEFAULT_STALE_MINUTES;

/// Longest accepted cache freshness window (one week)
const MAX_CACHE_STALE_MINUTES: i64 = 7 * 24 * 60;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base_url: String,
    pub request_timeout_secs: u64,
    pub cache_stale_minutes: i64,
    /// Share one in-flight refresh between concurrent 401s
    pub single_flight_refresh: bool,
    pub last_email: Option<String>,
    pub remember_password: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            cache_stale_minutes: DEFAULT_CACHE_STALE_MINUTES,
            single_flight_refresh: true,
            last_email: None,
            remember_password: false,
        }
    }
}

impl Config {
    /// Load the stored config, applying environment overrides.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        let mut config = Self::load_from(&path)?;
        config.apply_env_override(std::env::var(API_URL_ENV).ok());
        Ok(config)
    }

    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            let config: Self =
                serde_json::from_str(&contents).context("Failed to parse config file")?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Reject values the rest of the console cannot work with.
    pub fn validate(&self) -> Result<()> {
        if !(0..=MAX_CACHE_STALE_MINUTES).contains(&self.cache_stale_minutes) {
            anyhow::bail!(
                "cache_stale_minutes must be between 0 and {}, got {}",
                MAX_CACHE_STALE_MINUTES,
                self.cache_stale_minutes
            );
        }
        Ok(())
    }

    fn apply_env_override(&mut self, url: Option<String>) {
        if let Some(url) = url.filter(|u| !u.trim().is_empty()) {
            self.api_base_url = url.trim().to_string();
        }
    }

    /// Base URL without a trailing slash, ready for path concatenation.
    pub fn base_url(&self) -> &str {
        self.api_base_url.trim_end_matches('/')
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn log_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME).join("logs"))
    }
}
