use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::remote::RetryPolicy;

/// Source of a configuration value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    Default,
    File,
    Environment,
    Flag,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::Default => write!(f, "default"),
            ConfigSource::File => write!(f, "file"),
            ConfigSource::Environment => write!(f, "environment"),
            ConfigSource::Flag => write!(f, "flag"),
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }
}

/// Document store connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Firestore project id
    pub project_id: Option<String>,
    /// OAuth access token sent as a bearer token
    #[serde(skip_serializing)]
    pub access_token: Option<String>,
    /// Firestore emulator address (e.g. "localhost:8080")
    pub emulator_host: Option<String>,
    /// Attempts per read request (1 = no retry)
    pub read_attempts: u32,
    /// Delay between read attempts, in milliseconds
    pub retry_delay_ms: u64,
    /// Per-request timeout, in seconds
    pub timeout_secs: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            project_id: None,
            access_token: None,
            emulator_host: None,
            read_attempts: 1,
            retry_delay_ms: 500,
            timeout_secs: 30,
        }
    }
}

impl RemoteConfig {
    /// Returns true if a project is set
    pub fn is_configured(&self) -> bool {
        self.project_id.is_some()
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::fixed(self.read_attempts, Duration::from_millis(self.retry_delay_ms))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Application configuration with source tracking
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    /// Remote collection to sync
    pub collection: ConfigValue<String>,
    /// Local mirror directory
    pub mirror_dir: ConfigValue<PathBuf>,
    /// Config file path used (if any)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_file: Option<PathBuf>,
    /// Document store settings
    pub remote: RemoteConfig,
}

/// Internal struct for deserializing config file
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ConfigFile {
    collection: Option<String>,
    mirror_dir: Option<PathBuf>,
    remote: Option<RemoteConfig>,
}

impl Config {
    /// Load configuration with priority: env vars > config file > defaults
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        // Start with defaults
        let mut collection = ConfigValue::new("levels".to_string(), ConfigSource::Default);
        let mut mirror_dir = ConfigValue::new(PathBuf::from("levels"), ConfigSource::Default);
        let mut config_file = None;
        let mut remote = RemoteConfig::default();

        // Try to load from config file
        let path = config_path.unwrap_or_else(Self::default_config_path);
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadError(path.clone(), e))?;
            let file_config: ConfigFile = serde_yaml::from_str(&contents)
                .map_err(|e| ConfigError::ParseError(path.clone(), e))?;

            config_file = Some(path.clone());

            if let Some(name) = file_config.collection {
                collection = ConfigValue::new(name, ConfigSource::File);
            }
            if let Some(dir) = file_config.mirror_dir {
                // Resolve relative paths against config file's directory
                let resolved = if dir.is_relative() {
                    path.parent().map(|p| p.join(&dir)).unwrap_or(dir)
                } else {
                    dir
                };
                mirror_dir = ConfigValue::new(resolved, ConfigSource::File);
            }
            if let Some(remote_config) = file_config.remote {
                remote = remote_config;
            }
        }

        // Apply environment variable overrides
        if let Ok(name) = std::env::var("LEVELSYNC_COLLECTION") {
            collection = ConfigValue::new(name, ConfigSource::Environment);
        }
        if let Ok(dir) = std::env::var("LEVELSYNC_MIRROR_DIR") {
            mirror_dir = ConfigValue::new(PathBuf::from(dir), ConfigSource::Environment);
        }
        if let Ok(project) = std::env::var("LEVELSYNC_PROJECT_ID") {
            remote.project_id = Some(project);
        }
        if let Ok(token) = std::env::var("LEVELSYNC_ACCESS_TOKEN") {
            remote.access_token = Some(token);
        }
        if let Ok(host) = std::env::var("FIRESTORE_EMULATOR_HOST") {
            remote.emulator_host = Some(host);
        }
        if let Ok(attempts) = std::env::var("LEVELSYNC_READ_ATTEMPTS") {
            remote.read_attempts = attempts
                .parse()
                .map_err(|_| ConfigError::Invalid(format!("LEVELSYNC_READ_ATTEMPTS={}", attempts)))?;
        }

        Ok(Self {
            collection,
            mirror_dir,
            config_file,
            remote,
        })
    }

    /// Applies command-line overrides, which win over every other source.
    pub fn with_overrides(mut self, collection: Option<String>, dir: Option<PathBuf>) -> Self {
        if let Some(name) = collection {
            self.collection = ConfigValue::new(name, ConfigSource::Flag);
        }
        if let Some(dir) = dir {
            self.mirror_dir = ConfigValue::new(dir, ConfigSource::Flag);
        }
        self
    }

    /// Default config directory (platform-specific):
    /// - Linux: ~/.config/levelsync/
    /// - macOS: ~/Library/Application Support/levelsync/
    /// - Windows: %APPDATA%/levelsync/
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("levelsync")
    }

    /// Default config file path (platform-specific config dir + config.yaml)
    pub fn default_config_path() -> PathBuf {
        Self::default_config_dir().join("config.yaml")
    }
}

#[derive(Debug)]
pub enum ConfigError {
    ReadError(PathBuf, std::io::Error),
    ParseError(PathBuf, serde_yaml::Error),
    /// A required setting is absent
    Missing(&'static str),
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ReadError(path, e) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::ParseError(path, e) => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), e)
            }
            ConfigError::Missing(key) => write!(
                f,
                "Missing setting '{}'. Add it to the config file or the environment.",
                key
            ),
            ConfigError::Invalid(e) => write!(f, "Invalid configuration: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}
