//! Client configuration structs
//!
//! Loads configuration from environment variables (and a `.env` file if present).

use serde::Deserialize;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Main client configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    pub app: AppSettings,
    pub api: ApiConfig,
    pub live: LiveConfig,
}

/// General application settings
#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_app_name")]
    pub name: String,
    #[serde(default = "default_env")]
    pub env: Environment,
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }

    fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "production" => Some(Self::Production),
            "staging" => Some(Self::Staging),
            "development" => Some(Self::Development),
            _ => None,
        }
    }
}

/// HTTP API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Base URL, e.g. `http://localhost:8080/api`
    #[serde(default = "default_api_url")]
    pub base_url: String,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl ApiConfig {
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Live event channel configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LiveConfig {
    /// Websocket base URL, e.g. `ws://localhost:8080`
    #[serde(default = "default_ws_url")]
    pub ws_url: String,
    #[serde(default = "default_reconnect_initial_ms")]
    pub reconnect_initial_ms: u64,
    #[serde(default = "default_reconnect_max_ms")]
    pub reconnect_max_ms: u64,
    /// Consecutive failed reconnects before a degraded notice is raised
    #[serde(default = "default_degraded_after")]
    pub degraded_after: u32,
    /// Issue a fresh bulk read after every reconnect to heal missed events
    #[serde(default = "default_resync_on_reconnect")]
    pub resync_on_reconnect: bool,
    /// Queue size for channel notices and session commands
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
}

impl LiveConfig {
    #[must_use]
    pub fn reconnect_initial(&self) -> Duration {
        Duration::from_millis(self.reconnect_initial_ms)
    }

    #[must_use]
    pub fn reconnect_max(&self) -> Duration {
        Duration::from_millis(self.reconnect_max_ms)
    }
}

// Default value functions
fn default_app_name() -> String {
    "ama-client".to_string()
}

fn default_env() -> Environment {
    Environment::Development
}

fn default_api_url() -> String {
    "http://localhost:8080/api".to_string()
}

fn default_ws_url() -> String {
    "ws://localhost:8080".to_string()
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

fn default_reconnect_initial_ms() -> u64 {
    1_000
}

fn default_reconnect_max_ms() -> u64 {
    5_000
}

fn default_degraded_after() -> u32 {
    5
}

fn default_resync_on_reconnect() -> bool {
    true
}

fn default_event_buffer() -> usize {
    256
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            app: AppSettings {
                name: default_app_name(),
                env: default_env(),
            },
            api: ApiConfig {
                base_url: default_api_url(),
                request_timeout_ms: default_request_timeout_ms(),
            },
            live: LiveConfig::default(),
        }
    }
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            ws_url: default_ws_url(),
            reconnect_initial_ms: default_reconnect_initial_ms(),
            reconnect_max_ms: default_reconnect_max_ms(),
            degraded_after: default_degraded_after(),
            resync_on_reconnect: default_resync_on_reconnect(),
            event_buffer: default_event_buffer(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables
    ///
    /// Every variable has a default; only malformed values are errors.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = match lookup("APP_ENV") {
            Some(raw) => Environment::parse(&raw).ok_or(ConfigError::InvalidValue("APP_ENV", raw))?,
            None => default_env(),
        };

        let config = Self {
            app: AppSettings {
                name: lookup("APP_NAME").unwrap_or_else(default_app_name),
                env,
            },
            api: ApiConfig {
                base_url: lookup("AMA_API_URL")
                    .map(|s| s.trim_end_matches('/').to_string())
                    .unwrap_or_else(default_api_url),
                request_timeout_ms: parse_var(
                    &lookup,
                    "AMA_REQUEST_TIMEOUT_MS",
                    default_request_timeout_ms,
                )?,
            },
            live: LiveConfig {
                ws_url: lookup("AMA_WS_URL")
                    .map(|s| s.trim_end_matches('/').to_string())
                    .unwrap_or_else(default_ws_url),
                reconnect_initial_ms: parse_var(
                    &lookup,
                    "AMA_RECONNECT_INITIAL_MS",
                    default_reconnect_initial_ms,
                )?,
                reconnect_max_ms: parse_var(
                    &lookup,
                    "AMA_RECONNECT_MAX_MS",
                    default_reconnect_max_ms,
                )?,
                degraded_after: parse_var(&lookup, "AMA_DEGRADED_AFTER", default_degraded_after)?,
                resync_on_reconnect: match lookup("AMA_RESYNC_ON_RECONNECT") {
                    Some(raw) => parse_bool(&raw)
                        .ok_or(ConfigError::InvalidValue("AMA_RESYNC_ON_RECONNECT", raw))?,
                    None => default_resync_on_reconnect(),
                },
                event_buffer: parse_var(&lookup, "AMA_EVENT_BUFFER", default_event_buffer)?,
            },
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.live.event_buffer == 0 {
            return Err(ConfigError::InvalidValue("AMA_EVENT_BUFFER", "0".to_string()));
        }
        if self.live.reconnect_max_ms == 0 {
            return Err(ConfigError::InvalidValue("AMA_RECONNECT_MAX_MS", "0".to_string()));
        }
        if self.live.reconnect_max_ms < self.live.reconnect_initial_ms {
            return Err(ConfigError::InvalidValue(
                "AMA_RECONNECT_MAX_MS",
                format!(
                    "{} is below AMA_RECONNECT_INITIAL_MS ({})",
                    self.live.reconnect_max_ms, self.live.reconnect_initial_ms
                ),
            ));
        }
        Ok(())
    }
}

fn parse_var<F, T>(lookup: &F, key: &'static str, default: fn() -> T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key, raw)),
        None => Ok(default()),
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
