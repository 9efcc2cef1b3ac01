//! Plugin instance configuration.
//!
//! Serialized with the wire field names of the framework's JSON config
//! files (`mqtt_broker`, `mqtt_port`, …); missing fields fall back to the
//! defaults.

use std::fs;
use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::{PluginError, PluginResult};

/// Configuration handed to a plugin's `initialize`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginConfig {
    #[serde(rename = "mqtt_broker")]
    pub broker_host: String,
    #[serde(rename = "mqtt_port")]
    pub broker_port: u32,
    pub device_id: String,
    pub tenant: String,
    pub site: String,
    #[serde(rename = "mqtt_username")]
    pub username: String,
    #[serde(rename = "mqtt_password", skip_serializing_if = "String::is_empty")]
    pub password: String,
    /// Plugin-specific configuration, passed through opaquely.
    pub plugin_config: Value,
    /// Telemetry reporting interval in seconds.
    #[serde(rename = "telemetry_interval")]
    pub telemetry_interval_secs: u32,
    /// Minimum seconds between repeated event reports.
    #[serde(rename = "event_cooldown")]
    pub event_cooldown_secs: u32,
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            broker_host: "localhost".to_string(),
            broker_port: 1883,
            device_id: "device001".to_string(),
            tenant: "default".to_string(),
            site: "site1".to_string(),
            username: String::new(),
            password: String::new(),
            plugin_config: Value::Object(serde_json::Map::new()),
            telemetry_interval_secs: 60,
            event_cooldown_secs: 300,
        }
    }
}

impl PluginConfig {
    /// Load a configuration from a JSON file; absent fields keep their
    /// defaults.
    pub fn load_from_file(path: impl AsRef<Path>) -> PluginResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| PluginError::NotFound {
            name: format!("{} ({})", path.display(), e),
        })?;
        let config: Self = serde_json::from_str(&text)
            .map_err(|e| PluginError::Config(format!("invalid JSON in {}: {}", path.display(), e)))?;
        info!("loaded plugin config from {}", path.display());
        Ok(config)
    }

    /// Write the configuration to a JSON file.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> PluginResult<()> {
        let path = path.as_ref();
        let text = serde_json::to_string_pretty(self)
            .map_err(|e| PluginError::Config(e.to_string()))?;
        fs::write(path, text)
            .map_err(|e| PluginError::Config(format!("cannot write {}: {}", path.display(), e)))?;
        info!("saved plugin config to {}", path.display());
        Ok(())
    }
}
