//! Overlay configuration
//!
//! Defaults match the assistant's well-known local endpoint. A TOML file can
//! override them for development; every field is optional.

use crate::{OverlayError, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Endpoint the assistant listens on
pub const DEFAULT_ENDPOINT: &str = "ws://localhost:8000/ws";

/// Wait between a lost connection and the next attempt
pub const DEFAULT_RECONNECT_DELAY_MS: u64 = 3000;

/// Wait between an idle signal and hiding the overlay
pub const DEFAULT_HIDE_DELAY_MS: u64 = 1000;

/// Key that toggles the overlay manually
pub const DEFAULT_TOGGLE_KEY: &str = "Space";

/// Environment variable pointing at an explicit config file
pub const CONFIG_ENV_VAR: &str = "VOICE_OVERLAY_CONFIG";

/// Configuration for the overlay
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    /// WebSocket endpoint of the voice assistant
    pub endpoint: String,
    /// Reconnect delay in milliseconds
    pub reconnect_delay_ms: u64,
    /// Hide delay after an idle signal in milliseconds
    pub hide_delay_ms: u64,
    /// Name of the toggle key (egui key name, e.g. "Space", "F2")
    pub toggle_key: String,
    /// Buffer size for channels between the window and the runtime thread
    pub channel_buffer_size: usize,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            reconnect_delay_ms: DEFAULT_RECONNECT_DELAY_MS,
            hide_delay_ms: DEFAULT_HIDE_DELAY_MS,
            toggle_key: DEFAULT_TOGGLE_KEY.to_string(),
            channel_buffer_size: 64,
        }
    }
}

impl OverlayConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the endpoint
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Set the reconnect delay
    pub fn with_reconnect_delay_ms(mut self, delay: u64) -> Self {
        self.reconnect_delay_ms = delay;
        self
    }

    /// Set the hide delay
    pub fn with_hide_delay_ms(mut self, delay: u64) -> Self {
        self.hide_delay_ms = delay;
        self
    }

    /// Set the toggle key name
    pub fn with_toggle_key(mut self, key: impl Into<String>) -> Self {
        self.toggle_key = key.into();
        self
    }

    /// Set the channel buffer size
    pub fn with_channel_buffer_size(mut self, size: usize) -> Self {
        self.channel_buffer_size = size;
        self
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    pub fn hide_delay(&self) -> Duration {
        Duration::from_millis(self.hide_delay_ms)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if !(self.endpoint.starts_with("ws://") || self.endpoint.starts_with("wss://")) {
            return Err(OverlayError::ConfigError(format!(
                "endpoint must be a ws:// or wss:// URL, got {:?}",
                self.endpoint
            )));
        }

        // A zero delay would turn a dead endpoint into a hot loop
        if self.reconnect_delay_ms == 0 {
            return Err(OverlayError::ConfigError(
                "reconnect_delay_ms must be greater than zero".to_string(),
            ));
        }

        if self.hide_delay_ms == 0 {
            return Err(OverlayError::ConfigError(
                "hide_delay_ms must be greater than zero".to_string(),
            ));
        }

        if self.toggle_key.trim().is_empty() {
            return Err(OverlayError::ConfigError(
                "toggle_key must not be empty".to_string(),
            ));
        }

        if self.channel_buffer_size == 0 {
            return Err(OverlayError::ConfigError(
                "channel_buffer_size must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    /// Load and validate a configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| OverlayError::IOError(format!("{}: {}", path.display(), e)))?;

        let config: OverlayConfig = toml::from_str(&content)
            .map_err(|e| OverlayError::ConfigError(format!("{}: {}", path.display(), e)))?;

        config.validate()?;
        debug!("Loaded overlay config from {}", path.display());
        Ok(config)
    }

    /// Load from `$VOICE_OVERLAY_CONFIG` or the user config directory
    ///
    /// A missing file is not an error; defaults are used instead.
    pub fn load_or_default() -> Result<Self> {
        match Self::config_path() {
            Some(path) if path.exists() => Self::load(path),
            Some(path) => {
                info!("No config at {}, using defaults", path.display());
                Ok(Self::default())
            }
            None => Ok(Self::default()),
        }
    }

    /// Path the config is read from, if one can be determined
    pub fn config_path() -> Option<PathBuf> {
        if let Ok(explicit) = std::env::var(CONFIG_ENV_VAR) {
            if !explicit.trim().is_empty() {
                return Some(PathBuf::from(explicit));
            }
        }
        dirs::config_dir().map(|dir| dir.join("voice-overlay").join("config.toml"))
    }
}
