use buddy_core::{BuddyError, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub mod env_substitution;

pub use env_substitution::substitute_env_vars;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub deepseek: DeepSeekSettings,
    #[serde(default)]
    pub telegram: TelegramSettings,
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub memory: MemorySettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeepSeekSettings {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramSettings {
    #[serde(default)]
    pub bot_token: String,
    #[serde(default)]
    pub chat_id: String,
    #[serde(default = "default_telegram_api_base")]
    pub api_base: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_environment")]
    pub environment: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook_base_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemorySettings {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl AppConfig {
    pub fn from_yaml(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| BuddyError::ConfigError(format!("Failed to read config file: {}", e)))?;

        Self::from_str(&content)
    }

    pub fn from_str(yaml: &str) -> Result<Self> {
        Self::from_str_with_env(yaml, |key| env::var(key).ok())
    }

    /// Parse, substitute `${VAR}` references, then apply overrides from `lookup`.
    pub fn from_str_with_env(yaml: &str, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::parse(yaml)?;
        config.apply_env_overrides(lookup);
        config.validate()?;

        Ok(config)
    }

    /// Environment-only configuration, used when no config file exists.
    pub fn from_env() -> Result<Self> {
        let mut config = AppConfig::default();
        config.apply_env_overrides(|key| env::var(key).ok());
        config.validate()?;

        Ok(config)
    }

    /// Load the first config file found in the standard locations, or fall back to the environment.
    pub fn discover() -> Result<Self> {
        let config = Self::load(None)?;
        config.validate()?;
        Ok(config)
    }

    /// Read `path` (or the first existing search path) and apply environment
    /// overrides, without validating. Callers that need credentials call
    /// [`validate`](Self::validate) themselves.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let found = match path {
            Some(path) => Some(path.to_path_buf()),
            None => Self::search_paths().into_iter().find(|p| {
                debug!("Looking for config at {:?}", p);
                p.exists()
            }),
        };

        let mut config = match found {
            Some(path) => {
                info!("Loading configuration from: {:?}", path);
                let content = std::fs::read_to_string(&path)
                    .map_err(|e| BuddyError::ConfigError(format!("Failed to read config file: {}", e)))?;
                Self::parse(&content)?
            }
            None => {
                warn!("No config file found, using environment variables only");
                AppConfig::default()
            }
        };

        config.apply_env_overrides(|key| env::var(key).ok());
        Ok(config)
    }

    pub fn search_paths() -> Vec<PathBuf> {
        vec![
            PathBuf::from("config.yaml"),
            PathBuf::from("config").join("config.yaml"),
            PathBuf::from("/etc/weightbuddy/config.yaml"),
        ]
    }

    fn parse(yaml: &str) -> Result<Self> {
        // Empty documents parse to null; treat them as "all defaults"
        let mut value: serde_json::Value = serde_yaml::from_str(yaml)
            .map_err(|e| BuddyError::ConfigError(format!("Failed to parse YAML: {}", e)))?;
        if value.is_null() {
            value = serde_json::Value::Object(Default::default());
        }

        substitute_env_vars(&mut value)?;

        serde_json::from_value(value)
            .map_err(|e| BuddyError::ConfigError(format!("Invalid configuration: {}", e)))
    }

    /// Environment values take precedence over the file.
    fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(v) = get("DEEPSEEK_API_KEY") {
            self.deepseek.api_key = v;
        }
        if let Some(v) = get("DEEPSEEK_API_URL") {
            self.deepseek.api_url = v;
        }
        if let Some(v) = get("TELEGRAM_BOT_TOKEN") {
            self.telegram.bot_token = v;
        }
        if let Some(v) = get("TELEGRAM_CHAT_ID") {
            self.telegram.chat_id = v;
        }
        if let Some(v) = get("PORT") {
            match v.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => warn!("Ignoring invalid PORT value: {}", v),
            }
        }
        if let Some(v) = get("APP_ENV") {
            self.server.environment = v;
        }
        if let Some(v) = get("WEBHOOK_BASE_URL") {
            self.server.webhook_base_url = Some(v);
        }
        if let Some(v) = get("DATA_DIR") {
            self.memory.data_dir = PathBuf::from(v);
        }
    }

    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();

        if self.deepseek.api_key.is_empty() {
            errors.push("DEEPSEEK_API_KEY is required");
        }
        if self.telegram.bot_token.is_empty() {
            errors.push("TELEGRAM_BOT_TOKEN is required");
        }
        if self.telegram.chat_id.is_empty() {
            errors.push("TELEGRAM_CHAT_ID is required");
        }
        if !(0.0..=2.0).contains(&self.deepseek.temperature) {
            errors.push("Temperature must be between 0.0 and 2.0");
        }

        if !errors.is_empty() {
            return Err(BuddyError::ConfigError(errors.join("; ")));
        }
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.server.environment == "production"
    }
}

impl Default for DeepSeekSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_url: default_api_url(),
            model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
        }
    }
}

impl Default for TelegramSettings {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            chat_id: String::new(),
            api_base: default_telegram_api_base(),
        }
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            port: default_port(),
            environment: default_environment(),
            webhook_base_url: None,
        }
    }
}

impl Default for MemorySettings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

fn default_api_url() -> String { "https://api.deepseek.com/v1/chat/completions".to_string() }
fn default_model() -> String { "deepseek-chat".to_string() }
fn default_max_tokens() -> u32 { 300 }
fn default_temperature() -> f32 { 0.7 }
fn default_telegram_api_base() -> String { "https://api.telegram.org".to_string() }
fn default_port() -> u16 { 3001 }
fn default_environment() -> String { "development".to_string() }
fn default_data_dir() -> PathBuf { PathBuf::from("./data") }
