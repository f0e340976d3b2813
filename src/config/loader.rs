//! Configuration Loader
//!
//! Loads and validates configuration from TOML files. Every section is
//! optional; missing keys fall back to the built-in defaults.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::adapters::pump_fun::{
    DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_HEALTH_TIMEOUT_SECS, DEFAULT_HEALTH_URL, DEFAULT_WS_URL,
};
use crate::application::{AlertSettings, ConnectionConfig, DEFAULT_UPDATE_BUFFER, MAX_FRAME_BYTES};
use crate::domain::backoff::{
    ReconnectPolicy, DEFAULT_BASE_DELAY_MS, DEFAULT_JITTER_MS, DEFAULT_MAX_DELAY_MS,
    DEFAULT_MAX_RECONNECT_ATTEMPTS,
};
use crate::domain::store::{EventStore, DEFAULT_RECENT_CAPACITY, DEFAULT_SEEN_CAPACITY};

/// Environment variable overriding `[feed] ws_url`
pub const WS_URL_ENV: &str = "PUMP_ALERT_WS_URL";

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub feed: FeedSection,
    #[serde(default)]
    pub store: StoreSection,
    #[serde(default)]
    pub search: SearchSection,
    #[serde(default)]
    pub alerts: AlertsSection,
    #[serde(default)]
    pub health: HealthSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

/// Stream connection section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FeedSection {
    /// WebSocket endpoint
    pub ws_url: String,
    /// Reconnect after an unexpected close
    pub auto_reconnect: bool,
    pub reconnect_base_delay_ms: u64,
    /// Cap on any single reconnect delay
    pub reconnect_max_delay_ms: u64,
    /// Upper bound of the random jitter per delay
    pub reconnect_jitter_ms: u64,
    /// Reconnects allowed before giving up
    pub max_reconnect_attempts: u32,
    /// Handshake timeout
    pub connect_timeout_secs: u64,
    /// Larger frames are dropped undecoded
    pub max_frame_bytes: usize,
    /// Capacity of the manager's update channel
    pub update_buffer: usize,
}

impl Default for FeedSection {
    fn default() -> Self {
        Self {
            ws_url: DEFAULT_WS_URL.to_string(),
            auto_reconnect: true,
            reconnect_base_delay_ms: DEFAULT_BASE_DELAY_MS,
            reconnect_max_delay_ms: DEFAULT_MAX_DELAY_MS,
            reconnect_jitter_ms: DEFAULT_JITTER_MS,
            max_reconnect_attempts: DEFAULT_MAX_RECONNECT_ATTEMPTS,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            max_frame_bytes: MAX_FRAME_BYTES,
            update_buffer: DEFAULT_UPDATE_BUFFER,
        }
    }
}

impl FeedSection {
    /// Get WebSocket URL with environment variable override
    /// Checks PUMP_ALERT_WS_URL env var first, falls back to config value
    pub fn get_ws_url(&self) -> String {
        self.ws_url_or(std::env::var(WS_URL_ENV).ok())
    }

    fn ws_url_or(&self, env_value: Option<String>) -> String {
        env_value
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| self.ws_url.clone())
    }

    pub fn policy(&self) -> ReconnectPolicy {
        ReconnectPolicy {
            base_delay: Duration::from_millis(self.reconnect_base_delay_ms),
            max_delay: Duration::from_millis(self.reconnect_max_delay_ms),
            max_jitter: Duration::from_millis(self.reconnect_jitter_ms),
            max_attempts: self.max_reconnect_attempts,
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

/// Event store caps
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreSection {
    pub seen_capacity: usize,
    pub recent_capacity: usize,
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            seen_capacity: DEFAULT_SEEN_CAPACITY,
            recent_capacity: DEFAULT_RECENT_CAPACITY,
        }
    }
}

impl StoreSection {
    pub fn build_store(&self) -> EventStore {
        EventStore::with_capacities(self.seen_capacity, self.recent_capacity)
    }
}

/// Default search
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SearchSection {
    /// Comma-separated terms, e.g. "soos, social"
    pub terms: String,
    /// Ignore `terms` and match every token
    pub monitor_all: bool,
}

impl SearchSection {
    /// Raw input for `prepare_search`; empty selects monitor-all
    pub fn search_input(&self) -> &str {
        if self.monitor_all {
            ""
        } else {
            &self.terms
        }
    }
}

/// Match alert side effects
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AlertsSection {
    /// Send a notification per new match
    pub enabled: bool,
    /// Open the token page per new match
    pub open_links: bool,
}

impl Default for AlertsSection {
    fn default() -> Self {
        let settings = AlertSettings::default();
        Self {
            enabled: settings.enabled,
            open_links: settings.open_links,
        }
    }
}

impl From<&AlertsSection> for AlertSettings {
    fn from(section: &AlertsSection) -> Self {
        AlertSettings {
            enabled: section.enabled,
            open_links: section.open_links,
        }
    }
}

/// API health probe
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HealthSection {
    pub api_url: String,
    pub timeout_secs: u64,
}

impl Default for HealthSection {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_HEALTH_URL.to_string(),
            timeout_secs: DEFAULT_HEALTH_TIMEOUT_SECS,
        }
    }
}

impl HealthSection {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Logging configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level: "trace", "debug", "info", "warn", "error"
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

/// Load configuration from a TOML file (`~` is expanded)
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let raw = path.as_ref().to_string_lossy();
    let expanded = shellexpand::tilde(&raw);
    let content = std::fs::read_to_string(expanded.as_ref())?;
    parse_config(&content)
}

/// Parse and validate configuration from TOML text
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    config.validate()?;
    Ok(config)
}

fn invalid(message: String) -> ConfigError {
    ConfigError::ValidationError(message)
}

impl Config {
    /// Validate all configuration parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        let feed = &self.feed;

        if !(feed.ws_url.starts_with("ws://") || feed.ws_url.starts_with("wss://")) {
            return Err(invalid(format!(
                "ws_url must start with ws:// or wss://, got '{}'",
                feed.ws_url
            )));
        }

        if feed.reconnect_base_delay_ms == 0 {
            return Err(invalid("reconnect_base_delay_ms must be > 0".to_string()));
        }

        if feed.reconnect_max_delay_ms < feed.reconnect_base_delay_ms {
            return Err(invalid(format!(
                "reconnect_max_delay_ms ({}) must be >= reconnect_base_delay_ms ({})",
                feed.reconnect_max_delay_ms, feed.reconnect_base_delay_ms
            )));
        }

        if feed.connect_timeout_secs == 0 {
            return Err(invalid("connect_timeout_secs must be > 0".to_string()));
        }

        if feed.max_frame_bytes == 0 {
            return Err(invalid("max_frame_bytes must be > 0".to_string()));
        }

        if feed.update_buffer == 0 {
            return Err(invalid("update_buffer must be > 0".to_string()));
        }

        if self.store.seen_capacity == 0 || self.store.recent_capacity == 0 {
            return Err(invalid(format!(
                "store capacities must be > 0, got seen={} recent={}",
                self.store.seen_capacity, self.store.recent_capacity
            )));
        }

        if self.health.api_url.is_empty() {
            return Err(invalid("health api_url cannot be empty".to_string()));
        }

        if self.health.timeout_secs == 0 {
            return Err(invalid("health timeout_secs must be > 0".to_string()));
        }

        let level = self.logging.level.to_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            return Err(invalid(format!(
                "logging level must be one of {:?}, got '{}'",
                LOG_LEVELS, self.logging.level
            )));
        }

        Ok(())
    }
}

// Conversion from Config to the connection manager settings
impl From<&Config> for ConnectionConfig {
    fn from(config: &Config) -> Self {
        ConnectionConfig {
            ws_url: config.feed.get_ws_url(),
            auto_reconnect: config.feed.auto_reconnect,
            policy: config.feed.policy(),
            max_frame_bytes: config.feed.max_frame_bytes,
            update_buffer: config.feed.update_buffer,
        }
    }
}
