//! Application settings management

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable holding the inference endpoint bearer token
pub const API_KEY_ENV: &str = "ORFORM_MODEL_API_KEY";

/// Main application settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// General settings
    #[serde(default)]
    pub general: GeneralSettings,

    /// Token-classification back-end settings
    #[serde(default)]
    pub model: ModelSettings,

    /// Label map and correction data files
    #[serde(default)]
    pub labels: LabelSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralSettings {
    /// Data directory for label maps and correction files
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSettings {
    /// Back-end type (remote, rules-only)
    #[serde(default = "default_backend")]
    pub backend: String,

    /// Inference endpoint for the remote back-end
    #[serde(default)]
    pub endpoint: String,

    /// Bearer token for the inference endpoint
    #[serde(default)]
    pub api_key: String,

    /// Model directory or hub id the endpoint serves
    #[serde(default = "default_model_dir")]
    pub model_dir: String,

    /// Device the model runs on (cpu, cuda)
    #[serde(default = "default_device")]
    pub device: String,

    /// Pipeline aggregation strategy (none, simple, first, average, max)
    #[serde(default = "default_aggregation_strategy")]
    pub aggregation_strategy: String,

    /// Maximum sequence length for tokenization
    #[serde(default = "default_max_length")]
    pub max_length: usize,

    /// Batch size for inference
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelSettings {
    /// JSON array of valid BIO tags (relative paths resolve against data_dir)
    #[serde(default = "default_label_map")]
    pub label_map: PathBuf,

    /// JSONL file that reviewed corrections are appended to
    #[serde(default = "default_corrections")]
    pub corrections: PathBuf,

    /// JSONL training set that corrections are merged into
    #[serde(default = "default_training_data")]
    pub training_data: PathBuf,
}

// Default value functions

fn default_data_dir() -> PathBuf {
    ProjectDirs::from("com", crate::APP_NAME, crate::APP_NAME)
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("~/.local/share/orform"))
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_backend() -> String {
    "rules-only".to_string()
}

fn default_model_dir() -> String {
    "models/slot_model".to_string()
}

fn default_device() -> String {
    "cpu".to_string()
}

fn default_aggregation_strategy() -> String {
    "max".to_string()
}

fn default_max_length() -> usize {
    512
}

fn default_batch_size() -> usize {
    1
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_label_map() -> PathBuf {
    PathBuf::from("label_map.json")
}

fn default_corrections() -> PathBuf {
    PathBuf::from("labels/corrections.jsonl")
}

fn default_training_data() -> PathBuf {
    PathBuf::from("labels/train.jsonl")
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_level: default_log_level(),
        }
    }
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            endpoint: String::new(),
            api_key: String::new(),
            model_dir: default_model_dir(),
            device: default_device(),
            aggregation_strategy: default_aggregation_strategy(),
            max_length: default_max_length(),
            batch_size: default_batch_size(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for LabelSettings {
    fn default() -> Self {
        Self {
            label_map: default_label_map(),
            corrections: default_corrections(),
            training_data: default_training_data(),
        }
    }
}

impl Settings {
    /// Load settings from the configuration file
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            tracing::debug!("No config file found, using defaults");
            let mut settings = Self::default();
            settings.apply_env_overrides();
            return Ok(settings);
        }

        let content = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let mut settings: Settings = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;

        settings.apply_env_overrides();

        Ok(settings)
    }

    /// Apply environment variable overrides.
    fn apply_env_overrides(&mut self) {
        self.apply_api_key(std::env::var(API_KEY_ENV).ok());
    }

    /// A non-blank key fills `model.api_key` only when the config left it empty
    fn apply_api_key(&mut self, key: Option<String>) {
        if !self.model.api_key.trim().is_empty() {
            return;
        }
        if let Some(key) = key.filter(|k| !k.trim().is_empty()) {
            self.model.api_key = key;
        }
    }

    /// Get the path to the configuration file
    pub fn config_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("com", crate::APP_NAME, crate::APP_NAME)
            .context("Could not determine config directory")?;

        let config_dir = dirs.config_dir();
        Ok(config_dir.join("config.toml"))
    }

    /// Write default configuration to a file
    pub fn write_default(path: &PathBuf) -> Result<()> {
        let settings = Self::default();
        let content = toml::to_string_pretty(&settings)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the label map path
    pub fn label_map_path(&self) -> PathBuf {
        self.resolve(&self.labels.label_map)
    }

    /// Get the corrections file path
    pub fn corrections_path(&self) -> PathBuf {
        self.resolve(&self.labels.corrections)
    }

    /// Get the training data path
    pub fn training_data_path(&self) -> PathBuf {
        self.resolve(&self.labels.training_data)
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.general.data_dir.join(path)
        }
    }
}
