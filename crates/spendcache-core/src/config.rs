//! Application configuration management.
//!
//! Configuration is stored at `~/.config/spendcache/config.json` and can be
//! overridden from the environment (a `.env` file is loaded by the binary
//! before `Config::load` runs):
//!
//! - `SPENDCACHE_SOURCE`: `mock` or `http`
//! - `SPENDCACHE_API_URL`: base URL of the HTTP API (implies `http`)
//! - `SPENDCACHE_MOCK_LATENCY_MS`: simulated latency of the mock endpoint
//! - `SPENDCACHE_MOCK_DATA`: path of a fixture replacing the embedded one

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::api::{ApiClient, DataSource, MockApi};

/// Application name used for config/cache directory paths
const APP_NAME: &str = "spendcache";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Base latency of the mock endpoint. Long enough to see loading states.
const DEFAULT_MOCK_LATENCY_MS: u64 = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    #[default]
    Mock,
    Http,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub source: SourceKind,
    pub api_base_url: Option<String>,
    pub mock_latency_ms: u64,
    pub mock_data_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source: SourceKind::Mock,
            api_base_url: None,
            mock_latency_ms: DEFAULT_MOCK_LATENCY_MS,
            mock_data_path: None,
        }
    }
}

impl Config {
    /// Load the config file (defaults if absent), then apply environment overrides.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config: {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config: {}", path.display()))?
        } else {
            Self::default()
        };
        config.apply_overrides(|name| std::env::var(name).ok());
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

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn log_dir() -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME).join("logs"))
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(source) = lookup("SPENDCACHE_SOURCE") {
            match source.trim().to_lowercase().as_str() {
                "mock" => self.source = SourceKind::Mock,
                "http" => self.source = SourceKind::Http,
                other => warn!(value = other, "Ignoring unknown SPENDCACHE_SOURCE"),
            }
        }

        if let Some(url) = lookup("SPENDCACHE_API_URL").filter(|url| !url.trim().is_empty()) {
            self.api_base_url = Some(url);
            self.source = SourceKind::Http;
        }

        if let Some(latency) = lookup("SPENDCACHE_MOCK_LATENCY_MS") {
            match latency.trim().parse() {
                Ok(ms) => self.mock_latency_ms = ms,
                Err(_) => warn!(value = %latency, "Ignoring invalid SPENDCACHE_MOCK_LATENCY_MS"),
            }
        }

        if let Some(path) = lookup("SPENDCACHE_MOCK_DATA") {
            self.mock_data_path = Some(PathBuf::from(path));
        }
    }

    /// Build the data source this config selects.
    pub fn build_source(&self) -> Result<Arc<dyn DataSource>> {
        match self.source {
            SourceKind::Http => {
                let base_url = self
                    .api_base_url
                    .as_deref()
                    .ok_or_else(|| anyhow::anyhow!("HTTP source selected but no api_base_url configured"))?;
                info!(base_url, "Using HTTP data source");
                Ok(Arc::new(ApiClient::new(base_url)?))
            }
            SourceKind::Mock => {
                let mock = match &self.mock_data_path {
                    Some(path) => MockApi::from_path(path)?,
                    None => MockApi::embedded().context("Embedded mock fixture is invalid")?,
                };
                info!(latency_ms = self.mock_latency_ms, fixture = ?self.mock_data_path, "Using mock data source");
                Ok(Arc::new(mock.with_latency(Duration::from_millis(self.mock_latency_ms))))
            }
        }
    }
}
