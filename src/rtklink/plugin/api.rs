//! The device plugin capability interface.
//!
//! A device implementation exposes its capabilities through the
//! [`DevicePlugin`] trait: identity and capability reporting, state and
//! attribute snapshots, per-metric telemetry, event triggers, command
//! handling, and lifecycle hooks. Implementations registered in-process are
//! plain trait objects; shared-library plugins are adapted through the
//! C-ABI boundary in [`super::dynamic`].

use serde::{Deserialize, Serialize};

use super::config::PluginConfig;
use super::error::PluginResult;

/// Identity and capability summary reported by a device plugin.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Globally unique device identifier.
    pub id: String,
    pub device_type: String,
    pub model: String,
    pub serial_number: String,
    pub hw_version: String,
    pub fw_version: String,
    pub capabilities: Vec<String>,
}

/// Capability set a device implementation must expose.
///
/// `initialize` runs once at instance creation; `start`/`stop` may be
/// invoked repeatedly; `health_check` must be side-effect-free. Instances
/// may be driven from multiple threads, so the framework serializes access
/// behind a lock — implementations still own any state they share further.
pub trait DevicePlugin: Send {
    /// Identity and capability summary. Must succeed once `initialize` has.
    fn device_info(&self) -> DeviceInfo;

    /// Capability names; defaults to the `device_info` capability list.
    fn capabilities(&self) -> Vec<String> {
        self.device_info().capabilities
    }

    /// Current state payload as a JSON object.
    fn state_json(&self) -> PluginResult<String>;

    /// Attribute payload as a JSON object; defaults to empty.
    fn attributes_json(&self) -> PluginResult<String> {
        Ok("{}".to_string())
    }

    /// Telemetry payload for `metric` as a JSON object.
    fn telemetry_json(&self, metric: &str) -> PluginResult<String>;

    /// Metrics this device can report.
    fn telemetry_metrics(&self) -> Vec<String> {
        Vec::new()
    }

    /// React to an externally triggered event.
    fn on_event_trigger(&mut self, _event_type: &str, _data: &str) -> PluginResult<()> {
        Ok(())
    }

    /// Event types this device can emit.
    fn supported_events(&self) -> Vec<String> {
        Vec::new()
    }

    /// Execute a command request and produce the response payload JSON.
    fn handle_command(&mut self, cmd_json: &str) -> PluginResult<String>;

    /// Operations accepted by `handle_command`.
    fn supported_commands(&self) -> Vec<String> {
        Vec::new()
    }

    /// Bind the instance configuration. Runs once at instance creation.
    fn initialize(&mut self, config: &PluginConfig) -> PluginResult<()>;

    fn start(&mut self) -> PluginResult<()> {
        Ok(())
    }

    fn stop(&mut self) -> PluginResult<()> {
        Ok(())
    }

    /// Side-effect-free health probe; defaults to healthy.
    fn health_check(&self) -> bool {
        true
    }
}
