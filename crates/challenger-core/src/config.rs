//! Application configuration management.
//!
//! Holds the challenges server URL, where local state is stored and how long
//! the current-session marker lives.
//!
//! Configuration is stored at `~/.config/challenger-cache/config.json`.
//! `CHALLENGER_BASE_URL` in the environment overrides the server URL.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::api::client::DEFAULT_BASE_URL;

/// Application name used for config/storage directory paths
const APP_NAME: &str = "challenger-cache";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Environment variable overriding the configured server URL
pub const BASE_URL_ENV: &str = "CHALLENGER_BASE_URL";

/// Current-session marker lifetime when not configured
const DEFAULT_MARKER_TTL_DAYS: i64 = 365;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub base_url: Option<String>,
    pub storage_dir: Option<PathBuf>,
    pub marker_ttl_days: Option<i64>,
}

impl Config {
    /// Read the config file; a missing file means all defaults.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Server URL: environment, then config file, then the public server
    pub fn base_url(&self) -> String {
        self.resolve_base_url(std::env::var(BASE_URL_ENV).ok())
    }

    fn resolve_base_url(&self, env_override: Option<String>) -> String {
        env_override
            .filter(|url| !url.trim().is_empty())
            .or_else(|| self.base_url.clone())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
    }

    pub fn storage_dir(&self) -> Result<PathBuf> {
        if let Some(ref dir) = self.storage_dir {
            return Ok(dir.clone());
        }
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    /// Marker lifetime in days, at least one. A non-positive value would
    /// clear the marker instead of setting it.
    pub fn marker_ttl_days(&self) -> i64 {
        self.marker_ttl_days
            .unwrap_or(DEFAULT_MARKER_TTL_DAYS)
            .max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_precedence() {
        let config = Config {
            base_url: Some("http://localhost:4567".to_string()),
            ..Default::default()
        };
        assert_eq!(config.resolve_base_url(None), "http://localhost:4567");
        assert_eq!(
            config.resolve_base_url(Some("http://other".to_string())),
            "http://other"
        );
        assert_eq!(
            config.resolve_base_url(Some("  ".to_string())),
            "http://localhost:4567"
        );
        assert_eq!(Config::default().resolve_base_url(None), DEFAULT_BASE_URL);
    }

    #[test]
    fn test_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config.marker_ttl_days(), DEFAULT_MARKER_TTL_DAYS);

        let config = Config {
            storage_dir: Some(PathBuf::from("/tmp/challenger")),
            ..Default::default()
        };
        assert_eq!(config.storage_dir().unwrap(), PathBuf::from("/tmp/challenger"));
    }

    #[test]
    fn test_non_positive_marker_ttl_clamped() {
        for days in [0, -5] {
            let config = Config {
                marker_ttl_days: Some(days),
                ..Default::default()
            };
            assert_eq!(config.marker_ttl_days(), 1);
        }
        let config = Config {
            marker_ttl_days: Some(30),
            ..Default::default()
        };
        assert_eq!(config.marker_ttl_days(), 30);
    }
}
