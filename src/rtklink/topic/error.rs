//! Topic construction and parsing error types

use std::fmt;

/// Error type for topic operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopicError {
    /// A component, argument, or topic string was rejected
    InvalidParam(String),
    /// A build was requested before the builder was configured
    NotConfigured,
}

impl fmt::Display for TopicError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TopicError::InvalidParam(msg) => write!(f, "Invalid parameter: {}", msg),
            TopicError::NotConfigured => write!(f, "Topic builder not configured"),
        }
    }
}

impl std::error::Error for TopicError {}

pub type TopicResult<T> = Result<T, TopicError>;
