//! Application configuration
//!
//! Configuration is loaded from:
//! 1. Default values
//! 2. Config file (~/.config/tidings/config.toml)
//! 3. Environment variables (TIDINGS_* prefix)
//!
//! Environment variables take precedence over config file values.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Environment variable prefix
const ENV_PREFIX: &str = "TIDINGS";

/// Which notes backend to talk to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// In-process store, lost on exit
    #[default]
    Memory,
    /// Firebase Auth + Cloud Firestore over REST
    Firebase,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Memory => write!(f, "memory"),
            BackendKind::Firebase => write!(f, "firebase"),
        }
    }
}

impl FromStr for BackendKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "memory" => Ok(BackendKind::Memory),
            "firebase" => Ok(BackendKind::Firebase),
            other => bail!("Unknown backend '{}'. Expected 'memory' or 'firebase'.", other),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Notes backend
    #[serde(default)]
    pub backend: BackendKind,

    /// Firebase Web API key
    #[serde(default)]
    pub firebase_api_key: Option<String>,

    /// Firebase project ID (Firestore database lives under it)
    #[serde(default)]
    pub firebase_project_id: Option<String>,

    /// How often the Firestore listener re-runs its query
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// News API base URL
    #[serde(default = "default_news_api_url")]
    pub news_api_url: String,

    /// News API key
    #[serde(default)]
    pub news_api_key: Option<String>,

    /// Fixed search term sent with every headlines request
    #[serde(default = "default_news_query")]
    pub news_query: String,

    /// Country code selected on startup
    #[serde(default = "default_country")]
    pub default_country: String,

    /// HTTP request timeout
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Log level used when RUST_LOG is not set
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            firebase_api_key: None,
            firebase_project_id: None,
            poll_interval_secs: default_poll_interval_secs(),
            news_api_url: default_news_api_url(),
            news_api_key: None,
            news_query: default_news_query(),
            default_country: default_country(),
            request_timeout_secs: default_request_timeout_secs(),
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from default location and environment
    ///
    /// Order of precedence (highest to lowest):
    /// 1. Environment variables (TIDINGS_BACKEND, TIDINGS_NEWS_API_KEY, ...)
    /// 2. Config file (~/.config/tidings/config.toml or TIDINGS_CONFIG)
    /// 3. Default values
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::config_file_path())
    }

    /// Load configuration from a specific path
    ///
    /// Environment variables are still applied as overrides.
    /// If the file doesn't exist, defaults are used.
    pub fn load_from_path(path: &PathBuf) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration from a TOML string (useful for testing)
    pub fn load_from_str(toml_content: &str) -> Result<Self> {
        let mut config: Config =
            toml::from_str(toml_content).context("Failed to parse config TOML")?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        // TIDINGS_BACKEND
        if let Some(val) = env_var("BACKEND") {
            match val.parse() {
                Ok(kind) => self.backend = kind,
                Err(e) => tracing::warn!("Ignoring {}_BACKEND: {}", ENV_PREFIX, e),
            }
        }

        if let Some(val) = env_var("FIREBASE_API_KEY") {
            self.firebase_api_key = non_empty(val);
        }

        if let Some(val) = env_var("FIREBASE_PROJECT_ID") {
            self.firebase_project_id = non_empty(val);
        }

        if let Some(val) = env_var("NEWS_API_URL") {
            self.news_api_url = val;
        }

        if let Some(val) = env_var("NEWS_API_KEY") {
            self.news_api_key = non_empty(val);
        }

        if let Some(val) = env_var("COUNTRY") {
            self.default_country = val.to_ascii_lowercase();
        }

        if let Some(val) = env_var("POLL_INTERVAL_SECS") {
            if let Ok(secs) = val.parse() {
                self.poll_interval_secs = secs;
            }
        }

        if let Some(val) = env_var("NEWS_QUERY") {
            self.news_query = val;
        }

        if let Some(val) = env_var("REQUEST_TIMEOUT_SECS") {
            if let Ok(secs) = val.parse() {
                self.request_timeout_secs = secs;
            }
        }

        if let Some(val) = env_var("LOG_LEVEL") {
            self.log_level = val;
        }
    }

    /// Set a single value by key, as used by `tidings config set`
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "backend" => self.backend = value.parse()?,
            "firebase_api_key" => self.firebase_api_key = non_empty(value.to_string()),
            "firebase_project_id" => self.firebase_project_id = non_empty(value.to_string()),
            "poll_interval_secs" => {
                self.poll_interval_secs = value
                    .parse()
                    .with_context(|| format!("Invalid number of seconds: {}", value))?
            }
            "news_api_url" => self.news_api_url = value.to_string(),
            "news_api_key" => self.news_api_key = non_empty(value.to_string()),
            "news_query" => self.news_query = value.to_string(),
            "default_country" => self.default_country = value.to_ascii_lowercase(),
            "request_timeout_secs" => {
                self.request_timeout_secs = value
                    .parse()
                    .with_context(|| format!("Invalid number of seconds: {}", value))?
            }
            "log_level" => self.log_level = value.to_string(),
            _ => bail!("Unknown configuration key: {}", key),
        }
        Ok(())
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        self.save_to_path(&Self::config_file_path())
    }

    /// Save configuration to a specific file
    pub fn save_to_path(&self, config_path: &PathBuf) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(config_path, content)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;
        Ok(())
    }

    /// Get the config file path
    ///
    /// Can be overridden with TIDINGS_CONFIG environment variable
    pub fn config_file_path() -> PathBuf {
        if let Some(path) = env_var("CONFIG") {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tidings")
            .join("config.toml")
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(format!("{}_{}", ENV_PREFIX, name)).ok()
}

/// Empty strings clear optional values
fn non_empty(val: String) -> Option<String> {
    if val.is_empty() {
        None
    } else {
        Some(val)
    }
}

fn default_poll_interval_secs() -> u64 {
    5
}

fn default_news_api_url() -> String {
    "https://newsapi.org/v2".to_string()
}

fn default_news_query() -> String {
    "tesla".to_string()
}

fn default_country() -> String {
    "us".to_string()
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_log_level() -> String {
    "warn".to_string()
}
