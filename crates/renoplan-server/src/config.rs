//! Server configuration.

use anyhow::Result;
use renoplan_core::{GatewayConfig, ScraperConfig};
use serde::Deserialize;
use std::path::PathBuf;

/// Environment variable holding the AI gateway API key.
pub const GATEWAY_KEY_ENV: &str = "RENOPLAN_GATEWAY_API_KEY";
/// Environment variable holding the scraper API key.
pub const SCRAPER_KEY_ENV: &str = "RENOPLAN_SCRAPER_API_KEY";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
    /// Directory for anonymous chat histories.
    #[serde(default = "default_anonymous_dir")]
    pub anonymous_dir: PathBuf,
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub scraper: ScraperConfig,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("./frontend/dist")
}

fn data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("renoplan")
}

fn default_db_path() -> PathBuf {
    data_dir().join("renoplan.db")
}

fn default_anonymous_dir() -> PathBuf {
    data_dir().join("anonymous")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_dir: default_static_dir(),
            db_path: default_db_path(),
            anonymous_dir: default_anonymous_dir(),
            gateway: GatewayConfig::default(),
            scraper: ScraperConfig::default(),
        }
    }
}

impl Config {
    /// Load config from a specific file path.
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content)?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load config from default location (config/default.toml) or fall back to defaults.
    pub fn load() -> Result<Self> {
        let config_path = PathBuf::from("config/default.toml");
        if config_path.exists() {
            return Self::load_from(&config_path);
        }

        let mut config = Config::default();
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Fill API keys from the environment. Non-empty variables win over the file.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(GATEWAY_KEY_ENV).filter(|k| !k.trim().is_empty()) {
            self.gateway.api_key = key;
        }
        if let Some(key) = lookup(SCRAPER_KEY_ENV).filter(|k| !k.trim().is_empty()) {
            self.scraper.api_key = key;
        }
    }
}
