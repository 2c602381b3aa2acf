//! Console configuration
//!
//! Loaded once from TOML and handed out frozen. Every field has a default,
//! so an empty file (or no file) yields a working demo console.

use crate::error::ConfigError;
use console_security::{freeze, Frozen};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Console configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Backend API settings
    pub api: ApiConfig,
    /// Login gate settings
    pub login: LoginConfig,
    /// Dashboard metrics settings
    pub dashboard: DashboardConfig,
    /// Generative-text assistant settings
    pub assistant: AssistantConfig,
    /// Local storage settings
    pub storage: StorageConfig,
    /// Log filter settings
    pub logging: LoggingConfig,
}

impl ConsoleConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from TOML text
    ///
    /// # Errors
    /// - `ConfigError::Parse` on malformed TOML or wrong field types
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load from `path`, or defaults when no path is given
    ///
    /// # Errors
    /// - `ConfigError::Read` if the file cannot be read
    /// - `ConfigError::Parse` if it is not valid configuration
    pub fn load(path: Option<&Path>) -> Result<Frozen<Self>, ConfigError> {
        let config = match path {
            Some(path) => {
                let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;
                Self::from_toml_str(&text)?
            }
            None => Self::default(),
        };
        config.validate()?;
        Ok(freeze(config))
    }

    /// Reject values the console cannot run with
    ///
    /// # Errors
    /// - `ConfigError::Invalid` naming the offending field
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api.timeout_ms == 0 {
            return Err(ConfigError::Invalid("api.timeout_ms must be positive".into()));
        }
        if self.assistant.timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "assistant.timeout_ms must be positive".into(),
            ));
        }
        if self.dashboard.tick_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "dashboard.tick_interval_ms must be positive".into(),
            ));
        }
        if self.dashboard.window == 0 {
            return Err(ConfigError::Invalid("dashboard.window must be positive".into()));
        }
        Ok(())
    }
}

/// Backend API settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL prefixed to relative request paths
    pub base_url: String,
    /// Per-request deadline
    pub timeout_ms: u64,
}

impl ApiConfig {
    /// Deadline as a duration
    #[inline]
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Resolve `target` against the base URL unless it is already absolute
    #[must_use]
    pub fn resolve(&self, target: &str) -> String {
        if target.starts_with("http://") || target.starts_with("https://") {
            target.to_string()
        } else {
            format!(
                "{}/{}",
                self.base_url.trim_end_matches('/'),
                target.trim_start_matches('/')
            )
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".to_string(),
            timeout_ms: 8000,
        }
    }
}

/// Login gate settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginConfig {
    /// Accepted user id
    pub username: String,
    /// Accepted password
    pub password: String,
    /// Artificial latency before answering
    pub delay_ms: u64,
}

impl LoginConfig {
    /// Latency as a duration
    #[inline]
    #[must_use]
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

impl Default for LoginConfig {
    fn default() -> Self {
        Self {
            username: "admin123".to_string(),
            password: "admin".to_string(),
            delay_ms: 1500,
        }
    }
}

/// Dashboard metrics settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Interval between metric samples
    pub tick_interval_ms: u64,
    /// Number of samples kept
    pub window: usize,
}

impl DashboardConfig {
    /// Tick interval as a duration
    #[inline]
    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 2000,
            window: 20,
        }
    }
}

/// Generative-text assistant settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    /// Service endpoint
    pub endpoint: String,
    /// Model identifier
    pub model: String,
    /// Deadline for one generation call
    pub timeout_ms: u64,
}

impl AssistantConfig {
    /// Deadline as a duration
    #[inline]
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://generativelanguage.googleapis.com".to_string(),
            model: "gemini-2.0-flash".to_string(),
            timeout_ms: 15_000,
        }
    }
}

/// Local storage settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Credential file location
    pub credential_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            credential_path: PathBuf::from(".mk-console/credentials.json"),
        }
    }
}

/// Log filter settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "warn".to_string(),
        }
    }
}
