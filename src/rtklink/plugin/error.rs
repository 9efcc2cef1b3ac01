//! Plugin manager error types

use std::fmt;

/// Error type for plugin loading and instance lifecycle operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PluginError {
    /// An argument was rejected
    InvalidParam(String),
    /// No plugin or instance registered under the requested name
    NotFound { name: String },
    /// The shared library could not be opened or is missing required symbols
    LoadFailed { message: String },
    /// A plugin with this name is already loaded
    AlreadyLoaded { name: String },
    /// An instance with this name already exists
    AlreadyExists { name: String },
    /// The plugin still has running instances
    InUse { name: String },
    /// The instance is not running
    NotRunning { name: String },
    /// The plugin's capability table is missing required entries
    InvalidVtable { message: String },
    /// A bounded table is full
    Capacity { limit: usize },
    /// Configuration could not be read, parsed, or written
    Config(String),
    /// The plugin's `initialize` rejected the configuration
    Init { name: String, message: String },
    /// A plugin call failed
    CallFailed { operation: String, code: i32 },
}

impl fmt::Display for PluginError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PluginError::InvalidParam(msg) => write!(f, "Invalid parameter: {}", msg),
            PluginError::NotFound { name } => write!(f, "Plugin or instance not found: {}", name),
            PluginError::LoadFailed { message } => write!(f, "Plugin load failed: {}", message),
            PluginError::AlreadyLoaded { name } => write!(f, "Plugin already loaded: {}", name),
            PluginError::AlreadyExists { name } => {
                write!(f, "Instance already exists: {}", name)
            }
            PluginError::InUse { name } => {
                write!(f, "Plugin in use, instances still running: {}", name)
            }
            PluginError::NotRunning { name } => write!(f, "Instance not running: {}", name),
            PluginError::InvalidVtable { message } => {
                write!(f, "Invalid plugin vtable: {}", message)
            }
            PluginError::Capacity { limit } => write!(f, "Plugin table full (capacity {})", limit),
            PluginError::Config(msg) => write!(f, "Configuration error: {}", msg),
            PluginError::Init { name, message } => {
                write!(f, "Plugin initialization failed: {}: {}", name, message)
            }
            PluginError::CallFailed { operation, code } => {
                write!(f, "Plugin call '{}' failed with code {}", operation, code)
            }
        }
    }
}

impl std::error::Error for PluginError {}

pub type PluginResult<T> = Result<T, PluginError>;
