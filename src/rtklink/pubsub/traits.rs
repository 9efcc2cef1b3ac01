//! The pluggable transport abstraction.
//!
//! Any pub/sub client library can carry the protocol by implementing
//! [`PubSubBackend`]; the framework core never talks to sockets directly.
//! Backends are driven cooperatively: callers invoke `poll`/`yield_now`
//! periodically (or from a dedicated thread) to let the backend process
//! inbound data and fire the registered callbacks.

use std::sync::Arc;

use super::config::BrokerConfig;
use super::error::PubSubResult;

/// Handler for inbound messages: `(topic, payload)`.
pub type MessageCallback = Arc<dyn Fn(&str, &[u8]) + Send + Sync>;

/// Handler for connection transitions: `(connected, reason_code)`.
pub type ConnectionCallback = Arc<dyn Fn(bool, i32) + Send + Sync>;

/// MQTT-style delivery guarantee levels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum QoS {
    #[default]
    AtMostOnce,
    AtLeastOnce,
    ExactlyOnce,
}

impl QoS {
    pub fn as_u8(self) -> u8 {
        match self {
            QoS::AtMostOnce => 0,
            QoS::AtLeastOnce => 1,
            QoS::ExactlyOnce => 2,
        }
    }

    /// Out-of-range values clamp to `ExactlyOnce`.
    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => QoS::AtMostOnce,
            1 => QoS::AtLeastOnce,
            _ => QoS::ExactlyOnce,
        }
    }
}

/// A message travelling through a backend in either direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PubSubMessage {
    pub topic: String,
    pub payload: Vec<u8>,
    pub qos: QoS,
    pub retained: bool,
}

impl PubSubMessage {
    pub fn new(topic: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
            qos: QoS::default(),
            retained: false,
        }
    }

    pub fn with_qos(mut self, qos: QoS) -> Self {
        self.qos = qos;
        self
    }

    pub fn retained(mut self) -> Self {
        self.retained = true;
        self
    }
}

/// Capability set every transport adapter must implement.
///
/// Connect, disconnect, publish, and subscribe may block up to the
/// configured timeout; there is no built-in cancellation. Retry and backoff
/// policy belongs to the caller, layered above [`PubSubBackend::reconnect`].
pub trait PubSubBackend: Send {
    fn name(&self) -> &str;

    fn version(&self) -> &str;

    /// Bind the connection configuration. Called by the manager during
    /// `configure`, before any connect.
    fn init(&mut self, config: &BrokerConfig) -> PubSubResult<()>;

    /// Release backend resources. Called when the backend is swapped out.
    fn cleanup(&mut self) {}

    fn connect(&mut self) -> PubSubResult<()>;

    fn disconnect(&mut self) -> PubSubResult<()>;

    fn is_connected(&mut self) -> bool;

    /// Re-establish the connection. The default composes
    /// `disconnect` + `connect`; backends with a cheaper native path
    /// override it.
    fn reconnect(&mut self) -> PubSubResult<()> {
        if self.is_connected() {
            self.disconnect()?;
        }
        self.connect()
    }

    fn publish(&mut self, message: &PubSubMessage) -> PubSubResult<()>;

    fn subscribe(&mut self, topic: &str, qos: QoS) -> PubSubResult<()>;

    fn unsubscribe(&mut self, topic: &str) -> PubSubResult<()>;

    /// Process inbound data and invoke registered callbacks. Must be called
    /// periodically; this is a polling model, not an internal event loop.
    fn poll(&mut self, timeout_ms: u32) -> PubSubResult<()>;

    /// Yield briefly to the backend. The default falls back to `poll`.
    fn yield_now(&mut self, timeout_ms: u32) -> PubSubResult<()> {
        self.poll(timeout_ms)
    }

    /// Backend-reported connection status without touching the transport.
    fn connection_status(&self) -> bool;

    /// Human-readable context for the most recent failure.
    fn last_error(&self) -> Option<String> {
        None
    }

    /// Register the broker-side Last Will Testament. Optional capability;
    /// the default accepts and ignores it.
    fn set_will(&mut self, _message: &PubSubMessage) -> PubSubResult<()> {
        Ok(())
    }

    /// Clear a previously registered Last Will Testament.
    fn clear_will(&mut self) -> PubSubResult<()> {
        Ok(())
    }

    /// Install the inbound-message handler. Re-registration replaces the
    /// previous handler.
    fn set_message_callback(&mut self, callback: MessageCallback) -> PubSubResult<()>;
}
