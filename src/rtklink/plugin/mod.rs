//! Device plugin registration, dynamic loading, and instance lifecycle.
//!
//! - [`api::DevicePlugin`]: the capability set a device implementation
//!   exposes
//! - [`manager::PluginManager`]: bounded plugin table and instance slots
//! - [`dynamic`]: the C-ABI boundary for plugins loaded from shared
//!   libraries
//! - [`config::PluginConfig`]: per-instance configuration with JSON file
//!   round-trip

pub mod api;
pub mod config;
pub mod dynamic;
pub mod error;
pub mod manager;

pub use api::{DeviceInfo, DevicePlugin};
pub use config::PluginConfig;
pub use dynamic::{RawDeviceInfo, RawPluginConfig, RawPluginVtable};
pub use error::{PluginError, PluginResult};
pub use manager::{PluginInstance, PluginManager, PluginRecord, MAX_INSTANCES, MAX_PLUGINS};
