//! Broker connection configuration.

use super::error::{PubSubError, PubSubResult};
use super::traits::QoS;

/// Last-Will-Testament registration carried in the connection config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LwtConfig {
    pub topic: String,
    pub payload: Vec<u8>,
    pub qos: QoS,
    pub retained: bool,
}

/// Connection configuration handed to the active backend's `init`.
#[derive(Debug, Clone, PartialEq)]
pub struct BrokerConfig {
    pub host: String,
    /// Broker port; validated into `[1, 65535]`.
    pub port: u32,
    pub client_id: String,
    /// Empty means unauthenticated.
    pub username: String,
    pub password: String,
    pub keep_alive_secs: u32,
    pub clean_session: bool,
    pub connect_timeout_ms: u32,
    /// Suggested delay between application-level reconnect attempts.
    pub retry_interval_ms: u32,
    /// Suggested bound on application-level reconnect attempts.
    pub max_retry_count: u32,
    pub lwt: Option<LwtConfig>,
}

impl BrokerConfig {
    /// Configuration with the framework defaults: 60 s keep-alive, clean
    /// session, 30 s connect timeout, 5 s retry interval, 3 retries.
    pub fn new(host: impl Into<String>, port: u32, client_id: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port,
            client_id: client_id.into(),
            username: String::new(),
            password: String::new(),
            keep_alive_secs: 60,
            clean_session: true,
            connect_timeout_ms: 30_000,
            retry_interval_ms: 5_000,
            max_retry_count: 3,
            lwt: None,
        }
    }

    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = username.into();
        self.password = password.into();
        self
    }

    pub fn with_lwt(mut self, lwt: LwtConfig) -> Self {
        self.lwt = Some(lwt);
        self
    }

    /// Reject configurations the protocol cannot use: empty host, a port
    /// outside `[1, 65535]`, or an empty client id.
    pub fn validate(&self) -> PubSubResult<()> {
        if self.host.is_empty() {
            return Err(PubSubError::InvalidParam("broker host is empty".to_string()));
        }
        if self.port == 0 || self.port > 65_535 {
            return Err(PubSubError::InvalidParam(format!(
                "invalid broker port: {}",
                self.port
            )));
        }
        if self.client_id.is_empty() {
            return Err(PubSubError::InvalidParam("client id is empty".to_string()));
        }
        Ok(())
    }
}
