//! Publish/subscribe backend and manager error types

use std::fmt;

/// Error type for backend management and message I/O
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PubSubError {
    /// An argument or configuration value was rejected
    InvalidParam(String),
    /// Connect requested before `configure`
    NotConfigured,
    /// The operation requires an established connection
    NotConnected,
    /// Connect requested while already connected
    AlreadyConnected,
    /// The backend failed to establish a connection
    ConnectionFailed(String),
    /// A blocking operation ran past the backend's timeout
    Timeout,
    /// No backend registered under the requested name
    BackendNotFound { name: String },
    /// A backend is already registered under this name
    AlreadyRegistered { name: String },
    /// The bounded backend table is full
    Capacity { limit: usize },
    PublishFailed(String),
    SubscribeFailed(String),
    Network(String),
    Protocol(String),
    Unknown(String),
}

impl fmt::Display for PubSubError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PubSubError::InvalidParam(msg) => write!(f, "Invalid parameter: {}", msg),
            PubSubError::NotConfigured => write!(f, "Client not configured"),
            PubSubError::NotConnected => write!(f, "Not connected to broker"),
            PubSubError::AlreadyConnected => write!(f, "Already connected"),
            PubSubError::ConnectionFailed(msg) => write!(f, "Connection failed: {}", msg),
            PubSubError::Timeout => write!(f, "Operation timeout"),
            PubSubError::BackendNotFound { name } => write!(f, "Backend not found: {}", name),
            PubSubError::AlreadyRegistered { name } => {
                write!(f, "Backend already registered: {}", name)
            }
            PubSubError::Capacity { limit } => {
                write!(f, "Backend table full (capacity {})", limit)
            }
            PubSubError::PublishFailed(msg) => write!(f, "Publish failed: {}", msg),
            PubSubError::SubscribeFailed(msg) => write!(f, "Subscribe failed: {}", msg),
            PubSubError::Network(msg) => write!(f, "Network error: {}", msg),
            PubSubError::Protocol(msg) => write!(f, "Protocol error: {}", msg),
            PubSubError::Unknown(msg) => write!(f, "Unknown error: {}", msg),
        }
    }
}

impl std::error::Error for PubSubError {}

pub type PubSubResult<T> = Result<T, PubSubError>;
