//! Configuration management

pub mod commands;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::translate::cache;
use crate::translate::facade::DEFAULT_BATCH_DELAY;
use crate::translate::health;
use crate::translate::llm;
use crate::translate::manager::{self, ManagerSettings};

const CONFIG_FILE_NAME: &str = "config.toml";
const APP_NAME: &str = "iprompt";
pub const CONFIG_ENV: &str = "IPROMPT_CONFIG";
pub const ZHIPU_API_KEY_ENV: &str = "ZHIPU_API_KEY";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub zhipu: ZhipuConfig,

    #[serde(default)]
    pub translation: TranslationConfig,

    #[serde(default)]
    pub health: HealthConfig,

    /// Per-engine overrides keyed by engine key.
    #[serde(default)]
    pub engines: BTreeMap<String, EngineOverride>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GeneralConfig {
    #[serde(default)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZhipuConfig {
    /// Zhipu AI API key
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_zhipu_base")]
    pub base_url: String,

    #[serde(default = "default_zhipu_model")]
    pub model: String,
}

fn default_zhipu_base() -> String {
    llm::DEFAULT_BASE_URL.to_string()
}

fn default_zhipu_model() -> String {
    llm::DEFAULT_MODEL.to_string()
}

impl Default for ZhipuConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_zhipu_base(),
            model: default_zhipu_model(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationConfig {
    #[serde(default = "default_target")]
    pub default_target: String,

    #[serde(default = "default_source")]
    pub default_source: String,

    /// Pause between batch items, in milliseconds
    #[serde(default = "default_batch_delay_ms")]
    pub batch_delay_ms: u64,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,

    #[serde(default = "default_max_engine_hops")]
    pub max_engine_hops: usize,

    /// Consecutive failures before an engine is marked unavailable
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,
}

fn default_target() -> String {
    "en".to_string()
}

fn default_source() -> String {
    "auto".to_string()
}

fn default_batch_delay_ms() -> u64 {
    DEFAULT_BATCH_DELAY.as_millis() as u64
}

fn default_request_timeout_secs() -> u64 {
    manager::DEFAULT_REQUEST_TIMEOUT.as_secs()
}

fn default_cache_capacity() -> usize {
    cache::DEFAULT_CAPACITY
}

fn default_max_engine_hops() -> usize {
    manager::DEFAULT_MAX_ENGINE_HOPS
}

fn default_failure_threshold() -> u32 {
    manager::DEFAULT_FAILURE_THRESHOLD
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            default_target: default_target(),
            default_source: default_source(),
            batch_delay_ms: default_batch_delay_ms(),
            request_timeout_secs: default_request_timeout_secs(),
            cache_capacity: default_cache_capacity(),
            max_engine_hops: default_max_engine_hops(),
            failure_threshold: default_failure_threshold(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthConfig {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    #[serde(default = "default_initial_delay_secs")]
    pub initial_delay_secs: u64,
}

fn default_interval_secs() -> u64 {
    health::DEFAULT_INTERVAL.as_secs()
}

fn default_initial_delay_secs() -> u64 {
    health::DEFAULT_INITIAL_DELAY.as_secs()
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            initial_delay_secs: default_initial_delay_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct EngineOverride {
    #[serde(default)]
    pub priority: Option<i32>,

    /// Alternate endpoint for web-API engines
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Set to false to drop the engine from the registry
    #[serde(default)]
    pub enabled: Option<bool>,
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join(APP_NAME))
    }

    /// Get the config file path, honouring `IPROMPT_CONFIG`
    pub fn config_path() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            if !path.is_empty() {
                return Some(PathBuf::from(path));
            }
        }
        Self::config_dir().map(|p| p.join(CONFIG_FILE_NAME))
    }

    /// Load config from default location
    pub fn load() -> Result<Self> {
        let path = Self::config_path().context("Could not determine config path")?;
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;

        Ok(config)
    }

    /// Save config to default location
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_path().context("Could not determine config path")?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).context("Failed to create config directory")?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, content).context("Failed to write config file")?;

        Ok(())
    }

    /// Zhipu key from config, falling back to `ZHIPU_API_KEY`
    pub fn zhipu_api_key(&self) -> Option<String> {
        self.zhipu
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| std::env::var(ZHIPU_API_KEY_ENV).ok())
    }

    pub fn engine_override(&self, key: &str) -> EngineOverride {
        self.engines.get(key).cloned().unwrap_or_default()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.translation.request_timeout_secs.max(1))
    }

    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.translation.batch_delay_ms)
    }

    pub fn health_interval(&self) -> Duration {
        Duration::from_secs(self.health.interval_secs.max(1))
    }

    pub fn health_initial_delay(&self) -> Duration {
        Duration::from_secs(self.health.initial_delay_secs)
    }

    pub fn manager_settings(&self) -> ManagerSettings {
        ManagerSettings {
            cache_capacity: self.translation.cache_capacity.max(1),
            max_engine_hops: self.translation.max_engine_hops,
            failure_threshold: self.translation.failure_threshold.max(1),
            request_timeout: self.request_timeout(),
        }
    }
}
