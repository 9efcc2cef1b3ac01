//! In-process loopback backend.
//!
//! Queues published messages and delivers the ones matching a subscription
//! back through the registered message callback on `poll`. Gives tests and
//! device simulations a real transport without a broker; wildcard semantics
//! follow MQTT (`+` one level, `#` the remaining levels, end only).

use std::collections::VecDeque;

use log::{debug, trace};

use super::config::BrokerConfig;
use super::error::{PubSubError, PubSubResult};
use super::traits::{MessageCallback, PubSubBackend, PubSubMessage, QoS};

/// Loopback [`PubSubBackend`] implementation.
#[derive(Default)]
pub struct MemoryBackend {
    initialized: bool,
    connected: bool,
    subscriptions: Vec<String>,
    pending: VecDeque<PubSubMessage>,
    callback: Option<MessageCallback>,
    will: Option<PubSubMessage>,
    last_error: Option<String>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages published but not yet delivered by `poll`.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// The registered Last Will Testament, if any.
    pub fn will(&self) -> Option<&PubSubMessage> {
        self.will.as_ref()
    }

    /// Active subscription patterns.
    pub fn subscriptions(&self) -> &[String] {
        &self.subscriptions
    }

    fn fail<T>(&mut self, error: PubSubError) -> PubSubResult<T> {
        self.last_error = Some(error.to_string());
        Err(error)
    }
}

impl PubSubBackend for MemoryBackend {
    fn name(&self) -> &str {
        "memory"
    }

    fn version(&self) -> &str {
        "1.0.0"
    }

    fn init(&mut self, config: &BrokerConfig) -> PubSubResult<()> {
        debug!(
            "memory backend initialized for {}:{} as {}",
            config.host, config.port, config.client_id
        );
        if let Some(lwt) = &config.lwt {
            self.will = Some(PubSubMessage {
                topic: lwt.topic.clone(),
                payload: lwt.payload.clone(),
                qos: lwt.qos,
                retained: lwt.retained,
            });
        }
        self.initialized = true;
        Ok(())
    }

    fn cleanup(&mut self) {
        if self.connected {
            let _ = self.disconnect();
        }
        self.initialized = false;
        self.subscriptions.clear();
        self.pending.clear();
        self.callback = None;
        self.will = None;
    }

    fn connect(&mut self) -> PubSubResult<()> {
        if !self.initialized {
            return self.fail(PubSubError::ConnectionFailed(
                "backend not initialized".to_string(),
            ));
        }
        self.connected = true;
        Ok(())
    }

    fn disconnect(&mut self) -> PubSubResult<()> {
        self.connected = false;
        Ok(())
    }

    fn is_connected(&mut self) -> bool {
        self.connected
    }

    fn publish(&mut self, message: &PubSubMessage) -> PubSubResult<()> {
        if !self.connected {
            return self.fail(PubSubError::NotConnected);
        }
        trace!(
            "queued message on '{}' ({} bytes)",
            message.topic,
            message.payload.len()
        );
        self.pending.push_back(message.clone());
        Ok(())
    }

    fn subscribe(&mut self, topic: &str, _qos: QoS) -> PubSubResult<()> {
        if !self.connected {
            return self.fail(PubSubError::NotConnected);
        }
        if topic.is_empty() {
            return self.fail(PubSubError::InvalidParam("topic is empty".to_string()));
        }
        if !self.subscriptions.iter().any(|s| s == topic) {
            self.subscriptions.push(topic.to_string());
        }
        Ok(())
    }

    fn unsubscribe(&mut self, topic: &str) -> PubSubResult<()> {
        if !self.connected {
            return self.fail(PubSubError::NotConnected);
        }
        self.subscriptions.retain(|s| s != topic);
        Ok(())
    }

    fn poll(&mut self, _timeout_ms: u32) -> PubSubResult<()> {
        if !self.connected {
            return self.fail(PubSubError::NotConnected);
        }
        while let Some(message) = self.pending.pop_front() {
            let matched = self
                .subscriptions
                .iter()
                .any(|pattern| topic_matches(pattern, &message.topic));
            if !matched {
                continue;
            }
            if let Some(callback) = &self.callback {
                callback(&message.topic, &message.payload);
            }
        }
        Ok(())
    }

    fn connection_status(&self) -> bool {
        self.connected
    }

    fn last_error(&self) -> Option<String> {
        self.last_error.clone()
    }

    fn set_will(&mut self, message: &PubSubMessage) -> PubSubResult<()> {
        self.will = Some(message.clone());
        Ok(())
    }

    fn clear_will(&mut self) -> PubSubResult<()> {
        self.will = None;
        Ok(())
    }

    fn set_message_callback(&mut self, callback: MessageCallback) -> PubSubResult<()> {
        self.callback = Some(callback);
        Ok(())
    }
}

/// MQTT wildcard matching: `+` matches exactly one level, `#` matches the
/// remaining levels and is only a wildcard as the final pattern level.
pub fn topic_matches(pattern: &str, topic: &str) -> bool {
    let mut pattern_levels = pattern.split('/');
    let mut topic_levels = topic.split('/');

    loop {
        match (pattern_levels.next(), topic_levels.next()) {
            (Some("#"), _) => return pattern_levels.next().is_none(),
            (Some("+"), Some(_)) => continue,
            (Some(expected), Some(actual)) => {
                if expected != actual {
                    return false;
                }
            }
            (Some(_), None) => return false,
            (None, Some(_)) => return false,
            (None, None) => return true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match() {
        assert!(topic_matches("rtk/v1/t/s/d/state", "rtk/v1/t/s/d/state"));
        assert!(!topic_matches("rtk/v1/t/s/d/state", "rtk/v1/t/s/d/attr"));
    }

    #[test]
    fn test_single_level_wildcard() {
        assert!(topic_matches("rtk/v1/t/s/+/state", "rtk/v1/t/s/dev9/state"));
        assert!(!topic_matches("rtk/v1/t/s/+/state", "rtk/v1/t/s/dev9/extra/state"));
        assert!(!topic_matches("rtk/v1/t/s/+", "rtk/v1/t/s"));
    }

    #[test]
    fn test_multi_level_wildcard() {
        assert!(topic_matches("rtk/v1/t/s/+/evt/#", "rtk/v1/t/s/d/evt/wifi/roam"));
        assert!(topic_matches("rtk/v1/t/s/d/#", "rtk/v1/t/s/d/telemetry/temp"));
        // `#` only acts as a wildcard when it terminates the pattern
        assert!(!topic_matches("rtk/#/state", "rtk/v1/state"));
    }

    #[test]
    fn test_publish_requires_connection() {
        let mut backend = MemoryBackend::new();
        let err = backend
            .publish(&PubSubMessage::new("t", b"x".to_vec()))
            .unwrap_err();
        assert_eq!(err, PubSubError::NotConnected);
    }

    #[test]
    fn test_will_seeded_from_config() {
        use super::super::config::{BrokerConfig, LwtConfig};

        let mut backend = MemoryBackend::new();
        let config = BrokerConfig::new("localhost", 1883, "dev1").with_lwt(LwtConfig {
            topic: "rtk/v1/t/s/d/lwt".to_string(),
            payload: br#"{"status":"offline"}"#.to_vec(),
            qos: QoS::from_u8(1),
            retained: true,
        });
        backend.init(&config).unwrap();

        let will = backend.will().unwrap();
        assert_eq!(will.topic, "rtk/v1/t/s/d/lwt");
        assert_eq!(will.qos, QoS::AtLeastOnce);
        assert!(will.retained);

        backend.clear_will().unwrap();
        assert!(backend.will().is_none());
    }
}
