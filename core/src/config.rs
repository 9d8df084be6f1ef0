//! Configuration Management Module
//!
//! File-based client configuration with environment overrides and validation.
//! The file lives in the platform config directory unless a path is given, and
//! a default one is written on first run.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use crate::prediction::DEFAULT_HISTORY_KEY;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";
const ENV_PREFIX: &str = "FIVEWHY";

/// Configuration file format
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    #[default]
    Toml,
    Yaml,
}

impl ConfigFormat {
    /// Format implied by a file extension; TOML when there is none
    pub fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) => ext.parse(),
            None => Ok(ConfigFormat::Toml),
        }
    }

    fn extension(self) -> &'static str {
        match self {
            ConfigFormat::Json => "json",
            ConfigFormat::Toml => "toml",
            ConfigFormat::Yaml => "yaml",
        }
    }
}

impl std::str::FromStr for ConfigFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "json" => Ok(ConfigFormat::Json),
            "toml" => Ok(ConfigFormat::Toml),
            "yaml" | "yml" => Ok(ConfigFormat::Yaml),
            _ => Err(anyhow!("Unsupported config format: {}", s)),
        }
    }
}

/// Complete client configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub service: ServiceConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

/// Remote service settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Single base URL for every endpoint
    pub base_url: String,
    pub timeout_seconds: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_seconds: 30,
        }
    }
}

impl ServiceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// Local persistence settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory for the prediction history; platform data dir when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    pub history_key: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            history_key: DEFAULT_HISTORY_KEY.to_string(),
        }
    }
}

impl StorageConfig {
    /// Effective data directory
    pub fn resolved_data_dir(&self) -> PathBuf {
        self.data_dir
            .clone()
            .or_else(|| dirs::data_local_dir().map(|d| d.join("fivewhy")))
            .unwrap_or_else(|| PathBuf::from(".fivewhy"))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
    /// Also write daily-rolled log files here
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            log_dir: None,
        }
    }
}

impl ClientConfig {
    /// Check the settings that would otherwise fail at first use
    pub fn validate(&self) -> Result<()> {
        let url = reqwest::Url::parse(&self.service.base_url)
            .with_context(|| format!("Invalid base URL '{}'", self.service.base_url))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(anyhow!(
                "Base URL must use http or https, got '{}'",
                url.scheme()
            ));
        }

        if self.service.timeout_seconds == 0 {
            return Err(anyhow!("Request timeout must be greater than 0"));
        }

        if self.storage.history_key.trim().is_empty() {
            return Err(anyhow!("History key must not be empty"));
        }

        const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
        if !LEVELS.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(anyhow!(
                "Invalid log level '{}' (expected one of {})",
                self.logging.level,
                LEVELS.join(", ")
            ));
        }

        Ok(())
    }

    /// Apply `FIVEWHY_*` overrides read through `lookup`
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{}_{}", ENV_PREFIX, name));

        if let Some(base_url) = var("BASE_URL") {
            self.service.base_url = base_url;
            debug!("Applied env override for base URL");
        }

        if let Some(timeout) = var("TIMEOUT_SECONDS") {
            self.service.timeout_seconds = timeout
                .parse()
                .with_context(|| format!("Invalid {}_TIMEOUT_SECONDS '{}'", ENV_PREFIX, timeout))?;
            debug!("Applied env override for timeout");
        }

        if let Some(data_dir) = var("DATA_DIR") {
            self.storage.data_dir = Some(PathBuf::from(data_dir));
            debug!("Applied env override for data directory");
        }

        if let Some(level) = var("LOG_LEVEL") {
            self.logging.level = level;
            debug!("Applied env override for log level");
        }

        if let Some(json) = var("LOG_JSON") {
            self.logging.json = matches!(json.to_lowercase().as_str(), "1" | "true" | "yes");
            debug!("Applied env override for JSON logging");
        }

        Ok(())
    }
}

/// Configuration manager
pub struct ConfigManager {
    config_path: PathBuf,
    config_format: ConfigFormat,
    config: ClientConfig,
}

impl ConfigManager {
    /// Load (or create) the configuration in the platform config directory
    pub fn new() -> Result<Self> {
        let base = Self::get_config_dir()?.join("fivewhy").join("config");
        let format = Self::detect_config_format(&base);
        Self::open(base.with_extension(format.extension()), format)
    }

    /// Load (or create) the configuration at an explicit path
    pub fn with_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let format = ConfigFormat::from_path(&path)?;
        Self::open(path, format)
    }

    fn open(config_path: PathBuf, config_format: ConfigFormat) -> Result<Self> {
        let mut manager = Self {
            config_path,
            config_format,
            config: ClientConfig::default(),
        };

        if manager.config_exists() {
            manager.load_config()?;
        } else {
            manager.save_config()?;
        }

        manager.apply_env_overrides()?;
        manager.config.validate()?;
        Ok(manager)
    }

    fn get_config_dir() -> Result<PathBuf> {
        dirs::config_dir().ok_or_else(|| anyhow!("Could not determine config directory"))
    }

    /// First existing `config.{toml,json,yaml,yml}`, TOML if none
    fn detect_config_format(base_path: &Path) -> ConfigFormat {
        let candidates = [
            ("toml", ConfigFormat::Toml),
            ("json", ConfigFormat::Json),
            ("yaml", ConfigFormat::Yaml),
            ("yml", ConfigFormat::Yaml),
        ];
        candidates
            .iter()
            .find(|(ext, _)| base_path.with_extension(ext).exists())
            .map(|(_, format)| *format)
            .unwrap_or_default()
    }

    pub fn config_exists(&self) -> bool {
        self.config_path.exists()
    }

    pub fn load_config(&mut self) -> Result<()> {
        let content = fs::read_to_string(&self.config_path)
            .with_context(|| format!("Failed to read config file {:?}", self.config_path))?;

        self.config = match self.config_format {
            ConfigFormat::Toml => toml::from_str(&content)
                .map_err(|e| anyhow!("Failed to parse TOML config: {}", e))?,
            ConfigFormat::Json => serde_json::from_str(&content)
                .map_err(|e| anyhow!("Failed to parse JSON config: {}", e))?,
            ConfigFormat::Yaml => serde_yaml::from_str(&content)
                .map_err(|e| anyhow!("Failed to parse YAML config: {}", e))?,
        };

        info!("Loaded configuration from {:?}", self.config_path);
        Ok(())
    }

    pub fn save_config(&self) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory {:?}", parent))?;
        }

        let content = match self.config_format {
            ConfigFormat::Toml => toml::to_string_pretty(&self.config)
                .map_err(|e| anyhow!("Failed to serialize TOML config: {}", e))?,
            ConfigFormat::Json => serde_json::to_string_pretty(&self.config)
                .map_err(|e| anyhow!("Failed to serialize JSON config: {}", e))?,
            ConfigFormat::Yaml => serde_yaml::to_string(&self.config)
                .map_err(|e| anyhow!("Failed to serialize YAML config: {}", e))?,
        };

        fs::write(&self.config_path, content)
            .with_context(|| format!("Failed to write config file {:?}", self.config_path))?;

        info!("Saved configuration to {:?}", self.config_path);
        Ok(())
    }

    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.config.apply_overrides(|name| std::env::var(name).ok())
    }

    pub fn get_config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn get_config_mut(&mut self) -> &mut ClientConfig {
        &mut self.config
    }

    pub fn into_config(self) -> ClientConfig {
        self.config
    }

    pub fn get_config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn get_config_format(&self) -> ConfigFormat {
        self.config_format
    }
}
