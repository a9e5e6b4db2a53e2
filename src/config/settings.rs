//! Application settings and configuration management

use crate::error::{AppError, Result};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub credits: CreditsConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub providers: ProvidersConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

/// Credit ledger configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CreditsConfig {
    /// Balance granted to a user on first contact
    #[serde(default = "default_starting_balance")]
    pub starting_balance: i64,
}

fn default_starting_balance() -> i64 {
    100
}

impl Default for CreditsConfig {
    fn default() -> Self {
        Self {
            starting_balance: default_starting_balance(),
        }
    }
}

/// Generation pipeline configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GenerationConfig {
    /// Model assumed when the caller does not name one
    #[serde(default = "default_model")]
    pub default_model: String,
    /// Substitute model for the primary channel's second attempt
    #[serde(default = "default_fallback_model")]
    pub fallback_model: String,
    #[serde(default = "default_timeout")]
    pub timeout_ms: u64,
    #[serde(default)]
    pub attribution: AttributionConfig,
}

fn default_model() -> String {
    "openai/gpt-4o-mini".to_string()
}

fn default_fallback_model() -> String {
    "openai/gpt-4o-mini".to_string()
}

fn default_timeout() -> u64 {
    60000
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            default_model: default_model(),
            fallback_model: default_fallback_model(),
            timeout_ms: default_timeout(),
            attribution: AttributionConfig::default(),
        }
    }
}

/// Product-attribution headers sent with every provider request
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AttributionConfig {
    #[serde(default = "default_referer")]
    pub referer: String,
    #[serde(default = "default_title")]
    pub title: String,
}

fn default_referer() -> String {
    "https://edugen.app".to_string()
}

fn default_title() -> String {
    "EduGen Gateway".to_string()
}

impl Default for AttributionConfig {
    fn default() -> Self {
        Self {
            referer: default_referer(),
            title: default_title(),
        }
    }
}

/// Per-provider overrides; credentials are looked up from the environment
/// once at registry construction
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub openrouter: ProviderSettings,
    #[serde(default)]
    pub openai: ProviderSettings,
    #[serde(default)]
    pub gemini: ProviderSettings,
    #[serde(default)]
    pub groq: ProviderSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct ProviderSettings {
    /// Override for the provider's base URL
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Override for the environment variable holding the API key
    #[serde(default)]
    pub api_key_env: Option<String>,
}

impl Settings {
    /// Load settings from the default configuration file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path("config/gateway.yaml")
    }

    /// Load settings from a specific configuration file path
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config_path = path.as_ref();

        let format = if config_path
            .extension()
            .map_or(false, |ext| ext == "yaml" || ext == "yml")
        {
            FileFormat::Yaml
        } else {
            FileFormat::Toml
        };

        let mut config_builder = Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "json")?
            .set_default("credits.starting_balance", 100)?
            .set_default("generation.default_model", "openai/gpt-4o-mini")?
            .set_default("generation.fallback_model", "openai/gpt-4o-mini")?
            .set_default("generation.timeout_ms", 60000)?;

        if config_path.exists() {
            config_builder = config_builder.add_source(File::from(config_path).format(format));
        }

        config_builder = config_builder.add_source(
            Environment::with_prefix("EDUGEN")
                .separator("__")
                .try_parsing(true),
        );

        let config = config_builder.build()?;
        let settings: Settings = config.try_deserialize()?;
        Ok(settings)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(AppError::Config(config::ConfigError::Message(
                "Server port cannot be 0".to_string(),
            )));
        }

        if self.generation.fallback_model.is_empty() {
            return Err(AppError::Config(config::ConfigError::Message(
                "Fallback model cannot be empty".to_string(),
            )));
        }

        if self.generation.timeout_ms == 0 {
            return Err(AppError::Config(config::ConfigError::Message(
                "Request timeout cannot be 0".to_string(),
            )));
        }

        if self.credits.starting_balance < 0 {
            return Err(AppError::Config(config::ConfigError::Message(
                "Starting balance cannot be negative".to_string(),
            )));
        }

        Ok(())
    }
}
