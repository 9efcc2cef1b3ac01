//! Canonical topic construction and parsing.
//!
//! Topic layout:
//!
//! ```text
//! rtk/v1/{tenant}/{site}/{device_id}/state
//! rtk/v1/{tenant}/{site}/{device_id}/telemetry/{metric}
//! rtk/v1/{tenant}/{site}/{device_id}/evt/{event}
//! rtk/v1/{tenant}/{site}/{device_id}/attr
//! rtk/v1/{tenant}/{site}/{device_id}/cmd/{req|ack|res}
//! rtk/v1/{tenant}/{site}/{device_id}/lwt
//! rtk/v1/{tenant}/{site}/group/{group_id}/cmd/req
//! ```
//!
//! `parse_topic` inverts `TopicBuilder::build` for every device-scoped form,
//! so `parse_topic(build(t, m))` recovers the configured components, the
//! topic type, and the metric or event name.

use log::debug;

use super::error::{TopicError, TopicResult};

/// Leading literal of every canonical topic.
pub const TOPIC_PREFIX: &str = "rtk";
/// Protocol version component of every canonical topic.
pub const TOPIC_VERSION: &str = "v1";

/// Identity components shared by every topic built in one process context.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopicConfig {
    pub tenant: String,
    pub site: String,
    pub device_id: String,
    /// Group identifier for group command topics; unused otherwise.
    pub group_id: Option<String>,
}

impl TopicConfig {
    pub fn new(
        tenant: impl Into<String>,
        site: impl Into<String>,
        device_id: impl Into<String>,
    ) -> Self {
        Self {
            tenant: tenant.into(),
            site: site.into(),
            device_id: device_id.into(),
            group_id: None,
        }
    }

    pub fn with_group(mut self, group_id: impl Into<String>) -> Self {
        self.group_id = Some(group_id.into());
        self
    }

    /// Validate every component against the topic grammar.
    pub fn validate(&self) -> TopicResult<()> {
        validate_component(&self.tenant, "tenant")?;
        validate_component(&self.site, "site")?;
        validate_component(&self.device_id, "device_id")?;
        if let Some(group_id) = &self.group_id {
            validate_component(group_id, "group_id")?;
        }
        Ok(())
    }
}

/// Reject empty components and the reserved topic characters `+`, `#`, `/`.
fn validate_component(component: &str, name: &str) -> TopicResult<()> {
    if component.is_empty() {
        return Err(TopicError::InvalidParam(format!("{} is empty", name)));
    }
    if let Some(c) = component.chars().find(|c| matches!(c, '+' | '#' | '/')) {
        return Err(TopicError::InvalidParam(format!(
            "{} contains forbidden character '{}'",
            name, c
        )));
    }
    Ok(())
}

/// Message categories addressable by a canonical topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TopicType {
    State,
    Telemetry,
    Event,
    Attribute,
    CmdReq,
    CmdAck,
    CmdRes,
    Lwt,
    /// Group commands have their own layout; use `build_group_cmd`.
    GroupCmd,
}

/// Fixed wildcard subscription patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscribePattern {
    /// State of every device in the configured tenant/site.
    AllDevices,
    /// Every event from every device in the configured tenant/site.
    AllEvents,
    /// Every telemetry metric from every device in the configured tenant/site.
    AllTelemetry,
    /// Every command topic for every device in the configured tenant/site.
    AllCommands,
    /// Everything published under the configured device.
    DeviceAll,
    /// Cross-tenant event monitor; does not require configuration.
    GlobalMonitor,
}

/// Result of `parse_topic`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTopic {
    pub config: TopicConfig,
    pub topic_type: TopicType,
    pub metric_or_event: Option<String>,
}

/// Builds canonical topics from a validated [`TopicConfig`].
///
/// The builder holds no connection state and is cheap to construct; hosts
/// typically keep one per device context.
#[derive(Debug, Default)]
pub struct TopicBuilder {
    config: Option<TopicConfig>,
}

impl TopicBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and store the identity components used by every later build.
    pub fn set_config(&mut self, config: TopicConfig) -> TopicResult<()> {
        config.validate()?;
        debug!(
            "topic config set: tenant={}, site={}, device_id={}",
            config.tenant, config.site, config.device_id
        );
        self.config = Some(config);
        Ok(())
    }

    pub fn config(&self) -> Option<&TopicConfig> {
        self.config.as_ref()
    }

    fn configured(&self) -> TopicResult<&TopicConfig> {
        self.config.as_ref().ok_or(TopicError::NotConfigured)
    }

    fn base_topic(&self) -> TopicResult<String> {
        let config = self.configured()?;
        Ok(format!(
            "{}/{}/{}/{}/{}",
            TOPIC_PREFIX, TOPIC_VERSION, config.tenant, config.site, config.device_id
        ))
    }

    /// Build the topic for `topic_type`, appending the metric or event name
    /// where the type requires one.
    pub fn build(&self, topic_type: TopicType, metric_or_event: Option<&str>) -> TopicResult<String> {
        let base = self.base_topic()?;

        let suffix = match topic_type {
            TopicType::State => "/state".to_string(),
            TopicType::Telemetry => {
                let metric = metric_or_event.ok_or_else(|| {
                    TopicError::InvalidParam("telemetry topic requires metric name".to_string())
                })?;
                validate_component(metric, "metric")?;
                format!("/telemetry/{}", metric)
            }
            TopicType::Event => {
                let event = metric_or_event.ok_or_else(|| {
                    TopicError::InvalidParam("event topic requires event type".to_string())
                })?;
                validate_component(event, "event")?;
                format!("/evt/{}", event)
            }
            TopicType::Attribute => "/attr".to_string(),
            TopicType::CmdReq => "/cmd/req".to_string(),
            TopicType::CmdAck => "/cmd/ack".to_string(),
            TopicType::CmdRes => "/cmd/res".to_string(),
            TopicType::Lwt => "/lwt".to_string(),
            TopicType::GroupCmd => {
                return Err(TopicError::InvalidParam(
                    "use build_group_cmd for group commands".to_string(),
                ));
            }
        };

        Ok(base + &suffix)
    }

    pub fn build_state(&self) -> TopicResult<String> {
        self.build(TopicType::State, None)
    }

    pub fn build_telemetry(&self, metric: &str) -> TopicResult<String> {
        self.build(TopicType::Telemetry, Some(metric))
    }

    pub fn build_event(&self, event_type: &str) -> TopicResult<String> {
        self.build(TopicType::Event, Some(event_type))
    }

    pub fn build_attribute(&self) -> TopicResult<String> {
        self.build(TopicType::Attribute, None)
    }

    pub fn build_cmd_req(&self) -> TopicResult<String> {
        self.build(TopicType::CmdReq, None)
    }

    pub fn build_cmd_ack(&self) -> TopicResult<String> {
        self.build(TopicType::CmdAck, None)
    }

    pub fn build_cmd_res(&self) -> TopicResult<String> {
        self.build(TopicType::CmdRes, None)
    }

    pub fn build_lwt(&self) -> TopicResult<String> {
        self.build(TopicType::Lwt, None)
    }

    /// Build the command request topic for a device group:
    /// `rtk/v1/{tenant}/{site}/group/{group_id}/cmd/req`.
    pub fn build_group_cmd(&self, group_id: &str) -> TopicResult<String> {
        validate_component(group_id, "group_id")?;
        let config = self.configured()?;
        Ok(format!(
            "{}/{}/{}/{}/group/{}/cmd/req",
            TOPIC_PREFIX, TOPIC_VERSION, config.tenant, config.site, group_id
        ))
    }

    /// `build_group_cmd` for the group configured via
    /// [`TopicConfig::with_group`].
    pub fn build_configured_group_cmd(&self) -> TopicResult<String> {
        let group_id = self
            .configured()?
            .group_id
            .clone()
            .ok_or_else(|| TopicError::InvalidParam("no group_id configured".to_string()))?;
        self.build_group_cmd(&group_id)
    }

    /// Build one of the fixed wildcard subscription patterns.
    ///
    /// Every pattern except [`SubscribePattern::GlobalMonitor`] is scoped to
    /// the configured tenant/site and requires `set_config` first.
    pub fn subscribe_pattern(&self, pattern: SubscribePattern) -> TopicResult<String> {
        if let SubscribePattern::GlobalMonitor = pattern {
            return Ok(format!("{}/{}/+/+/+/evt/#", TOPIC_PREFIX, TOPIC_VERSION));
        }

        let config = self.configured()?;
        let scope = format!(
            "{}/{}/{}/{}",
            TOPIC_PREFIX, TOPIC_VERSION, config.tenant, config.site
        );

        Ok(match pattern {
            SubscribePattern::AllDevices => format!("{}/+/state", scope),
            SubscribePattern::AllEvents => format!("{}/+/evt/#", scope),
            SubscribePattern::AllTelemetry => format!("{}/+/telemetry/#", scope),
            SubscribePattern::AllCommands => format!("{}/+/cmd/#", scope),
            SubscribePattern::DeviceAll => format!("{}/{}/#", scope, config.device_id),
            SubscribePattern::GlobalMonitor => unreachable!("handled above"),
        })
    }
}

/// Parse a canonical device-scoped topic back into its components.
///
/// Dispatches on token count: six tokens resolve `state`/`attr`/`lwt` by
/// literal match, seven resolve `telemetry`/`evt` with a captured metric or
/// event name, and eight resolve `cmd/{req|ack|res}`.
pub fn parse_topic(topic: &str) -> TopicResult<ParsedTopic> {
    let invalid = || TopicError::InvalidParam(format!("invalid topic format: {}", topic));

    let tokens: Vec<&str> = topic.split('/').collect();
    if tokens.len() < 6 || tokens[0] != TOPIC_PREFIX || tokens[1] != TOPIC_VERSION {
        return Err(invalid());
    }

    let config = TopicConfig::new(tokens[2], tokens[3], tokens[4]);
    config.validate().map_err(|_| invalid())?;

    let (topic_type, metric_or_event) = match tokens.len() {
        6 => {
            let topic_type = match tokens[5] {
                "state" => TopicType::State,
                "attr" => TopicType::Attribute,
                "lwt" => TopicType::Lwt,
                _ => return Err(invalid()),
            };
            (topic_type, None)
        }
        7 if tokens[5] == "cmd" => {
            let topic_type = match tokens[6] {
                "req" => TopicType::CmdReq,
                "ack" => TopicType::CmdAck,
                "res" => TopicType::CmdRes,
                _ => return Err(invalid()),
            };
            (topic_type, None)
        }
        7 => {
            let topic_type = match tokens[5] {
                "telemetry" => TopicType::Telemetry,
                "evt" => TopicType::Event,
                _ => return Err(invalid()),
            };
            validate_component(tokens[6], "metric_or_event").map_err(|_| invalid())?;
            (topic_type, Some(tokens[6].to_string()))
        }
        _ => return Err(invalid()),
    };

    Ok(ParsedTopic {
        config,
        topic_type,
        metric_or_event,
    })
}

/// Whether `topic` parses as a canonical device-scoped topic.
pub fn topic_is_valid(topic: &str) -> bool {
    parse_topic(topic).is_ok()
}
