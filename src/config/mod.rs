//! Configuration module for dartbridge
//!
//! This module handles the bridge configuration:
//! - Upstream board manager endpoints and timing
//! - Liveness probe settings
//! - MQTT broker connection and topics
//! - Telemetry field set
//!
//! # Config Location
//!
//! The configuration is a TOML file. Unless `--config` is given it is read
//! from the platform-appropriate config directory under `dartbridge`:
//! - **Linux**: `~/.config/dartbridge/config.toml`
//! - **macOS**: `~/Library/Application Support/dartbridge/config.toml`
//! - **Windows**: `%APPDATA%\dartbridge\config.toml`
//!
//! # Example
//!
//! ```ignore
//! use dartbridge::config::BridgeConfig;
//!
//! let config = BridgeConfig::load("config.toml")?;
//! println!("state from {}", config.upstream.state_url(&config.upstream.state_paths[0]));
//! ```

pub mod settings;

pub use settings::*;

use crate::error::{BridgeError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application identifier for config directories
pub const APP_ID: &str = "dartbridge";

/// Config filename
pub const CONFIG_FILE: &str = "config.toml";

/// Default settle delay before fetching state after a throw event
pub const DEFAULT_SETTLE_DELAY_MS: u64 = 300;

/// Default timeout for upstream HTTP requests
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 1000;

/// Default delay between stream reconnect attempts
pub const DEFAULT_RECONNECT_DELAY_SECS: u64 = 2;

/// Default liveness poll interval
pub const DEFAULT_LIVENESS_INTERVAL_SECS: u64 = 10;

/// Default state and probe path on the board manager
pub const DEFAULT_STATE_PATH: &str = "/api/state";

/// Default event stream path on the board manager
pub const DEFAULT_EVENTS_PATH: &str = "/api/events";

// ==================== Config Directory ====================

/// Get the default config file path
pub fn default_config_path() -> Option<PathBuf> {
    dirs_next::config_dir().map(|p| p.join(APP_ID).join(CONFIG_FILE))
}

// ==================== Bridge Config ====================

/// Complete bridge configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BridgeConfig {
    /// Upstream board manager
    #[serde(default)]
    pub upstream: UpstreamConfig,

    /// Liveness probe
    #[serde(default)]
    pub liveness: LivenessConfig,

    /// MQTT broker
    #[serde(default)]
    pub mqtt: MqttConfig,

    /// Published field set
    #[serde(default)]
    pub telemetry: TelemetrySchema,
}

impl BridgeConfig {
    /// Parse and validate a configuration from TOML text
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)
            .map_err(|e| BridgeError::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            BridgeError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        Self::from_toml(&content).map_err(|e| e.with_context(format!("{}", path.display())))
    }

    /// Render a configuration as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| BridgeError::Config(format!("Failed to serialize config: {}", e)))
    }

    /// Create a sample configuration with placeholder hosts
    pub fn sample() -> Self {
        let mut config = Self::default();
        config.upstream.base_url = "http://192.168.178.10:3180".to_string();
        config.mqtt.host = "192.168.178.20".to_string();
        config
    }

    /// Check that every required setting is present and usable
    pub fn validate(&self) -> Result<()> {
        self.upstream.validate()?;
        self.liveness.validate()?;
        self.mqtt.validate()
    }
}

// ==================== Upstream Config ====================

/// Board manager endpoints and timing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// HTTP base URL (e.g., "http://192.168.178.10:3180")
    pub base_url: String,

    /// Event stream URL; derived from `base_url` when absent
    pub events_url: Option<String>,

    /// State paths tried in order, primary first
    pub state_paths: Vec<String>,

    /// Delay between a throw event and the state fetch in milliseconds
    pub settle_delay_ms: u64,

    /// Timeout for each state request in milliseconds
    pub request_timeout_ms: u64,

    /// Delay before reconnecting the event stream in seconds
    pub reconnect_delay_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            events_url: None,
            state_paths: vec![DEFAULT_STATE_PATH.to_string()],
            settle_delay_ms: DEFAULT_SETTLE_DELAY_MS,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            reconnect_delay_secs: DEFAULT_RECONNECT_DELAY_SECS,
        }
    }
}

impl UpstreamConfig {
    /// Full URL for a path on the board manager
    pub fn state_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    /// WebSocket URL of the event stream
    pub fn events_url(&self) -> String {
        if let Some(url) = &self.events_url {
            return url.clone();
        }
        let base = self.base_url.trim_end_matches('/');
        let ws_base = if let Some(rest) = base.strip_prefix("https://") {
            format!("wss://{}", rest)
        } else if let Some(rest) = base.strip_prefix("http://") {
            format!("ws://{}", rest)
        } else {
            base.to_string()
        };
        format!("{}{}", ws_base, DEFAULT_EVENTS_PATH)
    }

    /// Settle delay as a duration
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    /// Request timeout as a duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Reconnect delay as a duration
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.reconnect_delay_secs)
    }

    fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(BridgeError::Config(
                "upstream.base_url is required".to_string(),
            ));
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(BridgeError::Config(format!(
                "upstream.base_url must start with http:// or https://, got {:?}",
                self.base_url
            )));
        }
        if let Some(url) = &self.events_url {
            if !url.starts_with("ws://") && !url.starts_with("wss://") {
                return Err(BridgeError::Config(format!(
                    "upstream.events_url must start with ws:// or wss://, got {:?}",
                    url
                )));
            }
        }
        if self.state_paths.is_empty() {
            return Err(BridgeError::Config(
                "upstream.state_paths must list at least one path".to_string(),
            ));
        }
        if let Some(bad) = self.state_paths.iter().find(|p| !p.starts_with('/')) {
            return Err(BridgeError::Config(format!(
                "upstream.state_paths entries must start with '/', got {:?}",
                bad
            )));
        }
        if self.request_timeout_ms == 0 {
            return Err(BridgeError::Config(
                "upstream.request_timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self.reconnect_delay_secs == 0 {
            return Err(BridgeError::Config(
                "upstream.reconnect_delay_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

// ==================== Liveness Config ====================

/// Liveness probe settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LivenessConfig {
    /// Path probed on the board manager
    pub probe_path: String,

    /// Poll interval in seconds
    pub interval_secs: u64,

    /// Probe timeout in milliseconds
    pub timeout_ms: u64,
}

impl Default for LivenessConfig {
    fn default() -> Self {
        Self {
            probe_path: DEFAULT_STATE_PATH.to_string(),
            interval_secs: DEFAULT_LIVENESS_INTERVAL_SECS,
            timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
        }
    }
}

impl LivenessConfig {
    /// Poll interval as a duration
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Probe timeout as a duration
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    fn validate(&self) -> Result<()> {
        if !self.probe_path.starts_with('/') {
            return Err(BridgeError::Config(format!(
                "liveness.probe_path must start with '/', got {:?}",
                self.probe_path
            )));
        }
        if self.interval_secs == 0 || self.timeout_ms == 0 {
            return Err(BridgeError::Config(
                "liveness.interval_secs and liveness.timeout_ms must be greater than zero"
                    .to_string(),
            ));
        }
        Ok(())
    }
}

// ==================== MQTT Config ====================

/// MQTT broker connection and topics
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MqttConfig {
    /// Broker host name or address
    pub host: String,

    /// Broker port
    pub port: u16,

    /// Optional user name
    pub username: Option<String>,

    /// Optional password (required when `username` is set)
    pub password: Option<String>,

    /// Client identifier
    pub client_id: String,

    /// Topic for telemetry records
    pub state_topic: String,

    /// Topic for the retained online/offline status
    pub status_topic: String,

    /// Keep-alive interval in seconds
    pub keep_alive_secs: u64,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 1883,
            username: None,
            password: None,
            client_id: APP_ID.to_string(),
            state_topic: "autodarts/game/state".to_string(),
            status_topic: "autodarts/status".to_string(),
            keep_alive_secs: 30,
        }
    }
}

impl MqttConfig {
    /// Keep-alive interval as a duration
    pub fn keep_alive(&self) -> Duration {
        Duration::from_secs(self.keep_alive_secs)
    }

    fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(BridgeError::Config("mqtt.host is required".to_string()));
        }
        if self.state_topic.is_empty() || self.status_topic.is_empty() {
            return Err(BridgeError::Config(
                "mqtt.state_topic and mqtt.status_topic must not be empty".to_string(),
            ));
        }
        if self.client_id.is_empty() {
            return Err(BridgeError::Config(
                "mqtt.client_id must not be empty".to_string(),
            ));
        }
        if self.username.is_some() && self.password.is_none() {
            return Err(BridgeError::Config(
                "mqtt.password is required when mqtt.username is set".to_string(),
            ));
        }
        Ok(())
    }
}

// ==================== Tests ====================
