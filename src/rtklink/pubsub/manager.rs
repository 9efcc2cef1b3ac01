//! Active-backend management and connection-state handling.
//!
//! The manager owns exactly one active [`PubSubBackend`] at a time, tracks
//! the connection state machine, and delegates message I/O. Further backends
//! can be pre-registered as factories in a bounded lookup table and swapped
//! in by name; swapping disconnects and cleans up the outgoing backend.
//!
//! The manager keeps no internal synchronization: callers invoking
//! `poll`/`yield_now` from a dedicated thread must serialize access with
//! their own lock.

use std::fmt;

use log::{debug, info, warn};

use super::config::BrokerConfig;
use super::error::{PubSubError, PubSubResult};
use super::traits::{ConnectionCallback, MessageCallback, PubSubBackend, PubSubMessage, QoS};

/// Capacity of the backend factory table.
pub const MAX_BACKENDS: usize = 8;

type BackendFactory = Box<dyn Fn() -> Box<dyn PubSubBackend> + Send>;

fn no_backend() -> PubSubError {
    PubSubError::BackendNotFound {
        name: "(no active backend)".to_string(),
    }
}

/// Connection state machine, driven only by explicit calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No active backend installed.
    Uninitialized,
    /// Backend installed, not yet configured.
    Initialized,
    /// Configured, never connected.
    Configured,
    Connected,
    Disconnected,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConnectionState::Uninitialized => "No backend",
            ConnectionState::Initialized => "Not configured",
            ConnectionState::Configured => "Configured",
            ConnectionState::Connected => "Connected",
            ConnectionState::Disconnected => "Disconnected",
        };
        f.write_str(s)
    }
}

/// Manages one active pub/sub backend and its connection lifecycle.
pub struct PubSubManager {
    factories: Vec<(String, BackendFactory)>,
    backend: Option<Box<dyn PubSubBackend>>,
    config: Option<BrokerConfig>,
    state: ConnectionState,
    message_callback: Option<MessageCallback>,
    connection_callback: Option<ConnectionCallback>,
    last_error: String,
}

impl PubSubManager {
    pub fn new() -> Self {
        Self {
            factories: Vec::new(),
            backend: None,
            config: None,
            state: ConnectionState::Uninitialized,
            message_callback: None,
            connection_callback: None,
            last_error: String::new(),
        }
    }

    fn set_last_error(&mut self, error: &PubSubError) {
        self.last_error = error.to_string();
    }

    fn fail<T>(&mut self, error: PubSubError) -> PubSubResult<T> {
        self.set_last_error(&error);
        Err(error)
    }

    /// Human-readable context for the most recent failure, kept separate
    /// from the typed error codes.
    pub fn last_error(&self) -> &str {
        &self.last_error
    }

    // === Backend registration and switching ===

    /// Add a backend factory to the lookup table.
    ///
    /// The factory is invoked by [`PubSubManager::use_backend`] each time the
    /// backend is activated.
    pub fn register_backend<F>(&mut self, name: &str, factory: F) -> PubSubResult<()>
    where
        F: Fn() -> Box<dyn PubSubBackend> + Send + 'static,
    {
        if name.is_empty() {
            return self.fail(PubSubError::InvalidParam("backend name is empty".to_string()));
        }
        if self.factories.iter().any(|(n, _)| n == name) {
            return self.fail(PubSubError::AlreadyRegistered {
                name: name.to_string(),
            });
        }
        if self.factories.len() >= MAX_BACKENDS {
            return self.fail(PubSubError::Capacity {
                limit: MAX_BACKENDS,
            });
        }

        self.factories.push((name.to_string(), Box::new(factory)));
        info!("registered backend: {}", name);
        Ok(())
    }

    /// Names in the backend lookup table.
    pub fn backend_names(&self) -> Vec<String> {
        self.factories.iter().map(|(n, _)| n.clone()).collect()
    }

    /// Activate a registered backend by name.
    pub fn use_backend(&mut self, name: &str) -> PubSubResult<()> {
        let factory = self.factories.iter().find(|(n, _)| n == name);
        let backend = match factory {
            Some((_, factory)) => factory(),
            None => {
                return self.fail(PubSubError::BackendNotFound {
                    name: name.to_string(),
                })
            }
        };
        self.set_backend(backend)
    }

    /// Swap the active backend implementation.
    ///
    /// A connected outgoing backend is disconnected and cleaned up first,
    /// and the manager drops back to the unconfigured state: `configure`
    /// must run again before the next connect.
    pub fn set_backend(&mut self, backend: Box<dyn PubSubBackend>) -> PubSubResult<()> {
        if self.is_connected() {
            debug!("disconnecting current backend before switching");
            self.disconnect()?;
        }
        if let Some(mut old) = self.backend.take() {
            old.cleanup();
        }

        info!(
            "switched to backend: {} v{}",
            backend.name(),
            backend.version()
        );
        self.backend = Some(backend);
        self.config = None;
        self.state = ConnectionState::Initialized;

        // The stored handler outlives backend swaps
        if let Some(callback) = self.message_callback.clone() {
            if let Some(backend) = self.backend.as_mut() {
                backend.set_message_callback(callback)?;
            }
        }
        Ok(())
    }

    /// Name of the active backend, if one is installed.
    pub fn active_backend(&self) -> Option<&str> {
        self.backend.as_ref().map(|b| b.name())
    }

    fn backend_mut(&mut self) -> PubSubResult<&mut Box<dyn PubSubBackend>> {
        self.backend.as_mut().ok_or_else(no_backend)
    }

    // === Connection lifecycle ===

    /// Validate and store the connection configuration, then initialize the
    /// active backend with it.
    pub fn configure(&mut self, config: BrokerConfig) -> PubSubResult<()> {
        if self.backend.is_none() {
            return self.fail(no_backend());
        }
        if let Err(e) = config.validate() {
            return self.fail(e);
        }

        if let Err(e) = self.backend_mut()?.init(&config) {
            return self.fail(e);
        }

        info!("configured for broker: {}:{}", config.host, config.port);
        self.config = Some(config);
        self.state = ConnectionState::Configured;
        Ok(())
    }

    pub fn connect(&mut self) -> PubSubResult<()> {
        if self.backend.is_none() {
            return self.fail(no_backend());
        }
        if self.config.is_none() {
            return self.fail(PubSubError::NotConfigured);
        }
        if self.is_connected() {
            return self.fail(PubSubError::AlreadyConnected);
        }

        if let Err(e) = self.backend_mut()?.connect() {
            self.set_last_error(&e);
            return Err(e);
        }

        info!("connected to broker");
        self.state = ConnectionState::Connected;
        self.notify_connection(true, 0);
        Ok(())
    }

    /// Idempotent: returns success immediately when already disconnected.
    pub fn disconnect(&mut self) -> PubSubResult<()> {
        if self.backend.is_none() {
            return self.fail(no_backend());
        }
        if !self.is_connected() {
            return Ok(());
        }

        if let Err(e) = self.backend_mut()?.disconnect() {
            self.set_last_error(&e);
            return Err(e);
        }

        info!("disconnected from broker");
        self.state = ConnectionState::Disconnected;
        self.notify_connection(false, 0);
        Ok(())
    }

    pub fn is_connected(&mut self) -> bool {
        match self.backend.as_mut() {
            Some(backend) => {
                let connected = backend.is_connected();
                // Keep the state machine honest when the link drops under us
                if !connected && self.state == ConnectionState::Connected {
                    self.state = ConnectionState::Disconnected;
                }
                connected
            }
            None => false,
        }
    }

    /// Re-establish the connection through the backend's own `reconnect`.
    pub fn reconnect(&mut self) -> PubSubResult<()> {
        if self.backend.is_none() {
            return self.fail(no_backend());
        }
        if self.config.is_none() {
            return self.fail(PubSubError::NotConfigured);
        }

        if let Err(e) = self.backend_mut()?.reconnect() {
            self.state = ConnectionState::Disconnected;
            self.set_last_error(&e);
            return Err(e);
        }

        self.state = ConnectionState::Connected;
        self.notify_connection(true, 0);
        Ok(())
    }

    /// Current position in the connection state machine.
    pub fn connection_state(&mut self) -> ConnectionState {
        // Sync with the backend before reporting
        self.is_connected();
        self.state
    }

    // === Message I/O ===

    pub fn publish(
        &mut self,
        topic: &str,
        payload: &[u8],
        qos: QoS,
        retained: bool,
    ) -> PubSubResult<()> {
        if topic.is_empty() {
            return self.fail(PubSubError::InvalidParam("topic is empty".to_string()));
        }
        let mut message = PubSubMessage::new(topic, payload).with_qos(qos);
        message.retained = retained;
        self.publish_message(&message)
    }

    pub fn publish_message(&mut self, message: &PubSubMessage) -> PubSubResult<()> {
        if message.topic.is_empty() {
            return self.fail(PubSubError::InvalidParam("topic is empty".to_string()));
        }
        if !self.is_connected() {
            return self.fail(PubSubError::NotConnected);
        }

        if let Err(e) = self.backend_mut()?.publish(message) {
            self.set_last_error(&e);
            return Err(e);
        }
        Ok(())
    }

    pub fn subscribe(&mut self, topic: &str, qos: QoS) -> PubSubResult<()> {
        if topic.is_empty() {
            return self.fail(PubSubError::InvalidParam("topic is empty".to_string()));
        }
        if !self.is_connected() {
            return self.fail(PubSubError::NotConnected);
        }

        if let Err(e) = self.backend_mut()?.subscribe(topic, qos) {
            self.set_last_error(&e);
            return Err(e);
        }
        debug!("subscribed to topic: {}", topic);
        Ok(())
    }

    pub fn unsubscribe(&mut self, topic: &str) -> PubSubResult<()> {
        if topic.is_empty() {
            return self.fail(PubSubError::InvalidParam("topic is empty".to_string()));
        }
        if !self.is_connected() {
            return self.fail(PubSubError::NotConnected);
        }

        if let Err(e) = self.backend_mut()?.unsubscribe(topic) {
            self.set_last_error(&e);
            return Err(e);
        }
        debug!("unsubscribed from topic: {}", topic);
        Ok(())
    }

    /// Let the backend process inbound data and fire callbacks.
    ///
    /// Callers must invoke this periodically or from a dedicated polling
    /// thread; the manager runs no event loop of its own.
    pub fn poll(&mut self, timeout_ms: u32) -> PubSubResult<()> {
        if self.backend.is_none() {
            return self.fail(no_backend());
        }
        let was_connected = self.state == ConnectionState::Connected;
        let result = self.backend_mut()?.poll(timeout_ms);
        if let Err(e) = &result {
            self.set_last_error(e);
        }
        if was_connected && !self.is_connected() {
            warn!("connection lost during poll");
            self.notify_connection(false, -1);
        }
        result
    }

    /// Yield briefly to the backend; falls back to `poll` for backends
    /// without a native yield.
    pub fn yield_now(&mut self, timeout_ms: u32) -> PubSubResult<()> {
        if self.backend.is_none() {
            return self.fail(no_backend());
        }
        let result = self.backend_mut()?.yield_now(timeout_ms);
        if let Err(e) = &result {
            self.set_last_error(e);
        }
        result
    }

    // === Callback registration ===

    /// Install the inbound-message handler. Re-registration replaces the
    /// previous handler, it never stacks.
    pub fn set_message_callback(&mut self, callback: MessageCallback) -> PubSubResult<()> {
        self.message_callback = Some(callback.clone());
        if let Some(backend) = self.backend.as_mut() {
            backend.set_message_callback(callback)?;
        }
        Ok(())
    }

    /// Install the connection-transition handler. Re-registration replaces
    /// the previous handler.
    pub fn set_connection_callback(&mut self, callback: ConnectionCallback) -> PubSubResult<()> {
        self.connection_callback = Some(callback);
        Ok(())
    }

    fn notify_connection(&self, connected: bool, reason_code: i32) {
        if let Some(callback) = &self.connection_callback {
            callback(connected, reason_code);
        }
    }
}

impl Default for PubSubManager {
    fn default() -> Self {
        Self::new()
    }
}
