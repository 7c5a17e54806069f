//! Configuration loading, validation, and management for RadImpress.
//!
//! Loads configuration from `~/.radimpress/config.toml` with environment
//! variable overrides. Validates all settings at startup.
//!
//! The study type list lives in its own human-editable file and is handled
//! by [`StudyCatalog`].

pub mod studies;

pub use studies::{DEFAULT_STUDIES, StudyCatalog};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Inclusive bounds accepted for the sampling temperature.
pub const TEMPERATURE_RANGE: (f32, f32) = (0.0, 1.0);
/// Inclusive bounds accepted for the maximum response length.
pub const MAX_TOKENS_RANGE: (u32, u32) = (500, 2000);

/// The root configuration structure.
///
/// Maps directly to `~/.radimpress/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key for the language-model endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Base URL of the OpenAI-compatible endpoint
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Model selection and sampling defaults
    #[serde(default)]
    pub model: ModelConfig,

    /// Where studies, prompts and documents are stored
    #[serde(default)]
    pub storage: StorageConfig,

    /// Gateway configuration
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Token budget thresholds
    #[serde(default)]
    pub budget: BudgetConfig,
}

fn default_api_url() -> String {
    "https://api.openai.com/v1".into()
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .field("storage", &self.storage)
            .field("gateway", &self.gateway)
            .field("budget", &self.budget)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "default_model")]
    pub default_model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Models offered in the settings panel
    #[serde(default = "default_available_models")]
    pub available: Vec<ModelOption>,
}

/// A selectable model with its display label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelOption {
    pub id: String,
    pub label: String,
}

impl ModelOption {
    fn new(id: &str, label: &str) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }
}

fn default_model() -> String {
    "gpt-4o-mini".into()
}
fn default_temperature() -> f32 {
    0.1
}
fn default_max_tokens() -> u32 {
    800
}
fn default_available_models() -> Vec<ModelOption> {
    vec![
        ModelOption::new("gpt-4o", "gpt-4o (128k context)"),
        ModelOption::new("gpt-4o-mini", "gpt-4o-mini (128k context)"),
        ModelOption::new("gpt-4-turbo", "gpt-4-turbo (128k context)"),
    ]
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            default_model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            available: default_available_models(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Data directory; defaults to the config directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,
}

fn default_port() -> u16 {
    8421
}
fn default_host() -> String {
    "127.0.0.1".into()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}

/// Estimated-token thresholds for the assembled system prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetConfig {
    /// Above this the prompt is flagged as a large context
    #[serde(default = "default_warn_tokens")]
    pub warn_tokens: usize,

    /// Above this the prompt may exceed the context window
    #[serde(default = "default_error_tokens")]
    pub error_tokens: usize,

    /// Above this the API call is refused
    #[serde(default = "default_ceiling_tokens")]
    pub ceiling_tokens: usize,
}

fn default_warn_tokens() -> usize {
    50_000
}
fn default_error_tokens() -> usize {
    100_000
}
fn default_ceiling_tokens() -> usize {
    120_000
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            warn_tokens: default_warn_tokens(),
            error_tokens: default_error_tokens(),
            ceiling_tokens: default_ceiling_tokens(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.radimpress/config.toml).
    ///
    /// Also checks environment variables:
    /// - `RADIMPRESS_API_KEY` (highest priority), then `OPENAI_API_KEY`
    /// - `RADIMPRESS_MODEL`
    /// - `RADIMPRESS_DATA_DIR`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;

        if config.api_key.is_none() {
            config.api_key = std::env::var("RADIMPRESS_API_KEY")
                .ok()
                .or_else(|| std::env::var("OPENAI_API_KEY").ok())
                .filter(|k| !k.trim().is_empty());
        }

        if let Ok(model) = std::env::var("RADIMPRESS_MODEL") {
            config.model.default_model = model;
        }

        if let Ok(dir) = std::env::var("RADIMPRESS_DATA_DIR") {
            config.storage.data_dir = Some(dir);
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".radimpress")
    }

    /// Directory holding the studies file, prompt records and documents.
    pub fn data_dir(&self) -> PathBuf {
        match &self.storage.data_dir {
            Some(dir) => PathBuf::from(dir),
            None => Self::config_dir(),
        }
    }

    /// The human-editable study type list.
    pub fn studies_path(&self) -> PathBuf {
        self.data_dir().join("studies.toml")
    }

    /// The per-study prompt template record.
    pub fn prompts_path(&self) -> PathBuf {
        self.data_dir().join("study_prompts.json")
    }

    /// The per-study reference document directory.
    pub fn documents_dir(&self) -> PathBuf {
        self.data_dir().join("study_documents")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        let (t_min, t_max) = TEMPERATURE_RANGE;
        if !(t_min..=t_max).contains(&self.model.temperature) {
            return Err(ConfigError::ValidationError(format!(
                "model.temperature must be between {t_min} and {t_max}"
            )));
        }

        let (m_min, m_max) = MAX_TOKENS_RANGE;
        if !(m_min..=m_max).contains(&self.model.max_tokens) {
            return Err(ConfigError::ValidationError(format!(
                "model.max_tokens must be between {m_min} and {m_max}"
            )));
        }

        if self.model.default_model.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "model.default_model must not be empty".into(),
            ));
        }

        let b = &self.budget;
        if b.warn_tokens > b.error_tokens || b.error_tokens > b.ceiling_tokens {
            return Err(ConfigError::ValidationError(
                "budget thresholds must satisfy warn_tokens <= error_tokens <= ceiling_tokens"
                    .into(),
            ));
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Generate a default config TOML string (for `onboard` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: default_api_url(),
            model: ModelConfig::default(),
            storage: StorageConfig::default(),
            gateway: GatewayConfig::default(),
            budget: BudgetConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.model.default_model, "gpt-4o-mini");
        assert_eq!(config.model.max_tokens, 800);
        assert_eq!(config.budget.ceiling_tokens, 120_000);
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.model.default_model, config.model.default_model);
        assert_eq!(parsed.gateway.port, config.gateway.port);
        assert_eq!(parsed.model.available.len(), 3);
    }

    #[test]
    fn invalid_temperature_rejected() {
        let mut config = AppConfig::default();
        config.model.temperature = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn max_tokens_out_of_range_rejected() {
        let mut config = AppConfig::default();
        config.model.max_tokens = 100;
        assert!(config.validate().is_err());
        config.model.max_tokens = 2000;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn unordered_budget_rejected() {
        let mut config = AppConfig::default();
        config.budget.warn_tokens = 110_000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let config = AppConfig::load_from(Path::new("/nonexistent/config.toml")).unwrap();
        assert_eq!(config.api_url, "https://api.openai.com/v1");
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[model]\ndefault_model = \"gpt-4o\"\n\n[storage]\ndata_dir = \"/srv/radimpress\"\n",
        )
        .unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.model.default_model, "gpt-4o");
        assert!((config.model.temperature - 0.1).abs() < f32::EPSILON);
        assert_eq!(config.data_dir(), PathBuf::from("/srv/radimpress"));
        assert_eq!(
            config.prompts_path(),
            PathBuf::from("/srv/radimpress/study_prompts.json")
        );
    }

    #[test]
    fn malformed_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "model = [").unwrap();
        assert!(matches!(
            AppConfig::load_from(&path),
            Err(ConfigError::ParseError { .. })
        ));
    }

    #[test]
    fn debug_redacts_api_key() {
        let config = AppConfig {
            api_key: Some("sk-secret".into()),
            ..AppConfig::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("gpt-4o-mini"));
        assert!(toml_str.contains("8421"));
    }
}
