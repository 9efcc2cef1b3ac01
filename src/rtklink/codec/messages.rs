//! Per-type message builders composing the common envelope.
//!
//! Each builder owns the type-specific field set and applies the envelope
//! rules from [`super::envelope`]: unset optional numerics are omitted from
//! the output, and custom JSON objects are shallow-merged into the top
//! level.

use std::fmt;

use serde_json::{Map, Value};

use super::envelope::{current_timestamp_millis, envelope_map, merge_custom, TraceInfo};
use super::error::{CodecError, CodecResult};
use crate::rtklink::schema::SCHEMA_STATE_V1_0;

/// Temperatures at or below absolute zero mark the field as unset.
pub const TEMPERATURE_UNSET_C: f64 = -273.15;

/// Event severity levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Severity {
    #[default]
    Info,
    Warning,
    Error,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown strings decode to `Info`, the safe default.
impl From<&str> for Severity {
    fn from(s: &str) -> Self {
        match s {
            "warning" => Severity::Warning,
            "error" => Severity::Error,
            "critical" => Severity::Critical,
            _ => Severity::Info,
        }
    }
}

/// Device state message: health plus optional runtime metrics.
#[derive(Debug, Clone, PartialEq)]
pub struct StateMessage {
    pub schema: String,
    /// Health summary: `ok`, `warn`, or `error`.
    pub health: String,
    pub fw_version: Option<String>,
    /// Seconds since boot; values ≤ 0 are treated as unset.
    pub uptime_seconds: i64,
    /// CPU utilisation percentage; negative values are treated as unset.
    pub cpu_usage: f64,
    /// Memory utilisation percentage; negative values are treated as unset.
    pub memory_usage: f64,
    /// Temperature in °C; values ≤ −273.15 are treated as unset.
    pub temperature_c: f64,
    /// Custom JSON object merged into the top level of the output.
    pub custom_data: Option<String>,
    pub trace: Option<TraceInfo>,
}

impl StateMessage {
    pub fn new(health: impl Into<String>) -> Self {
        Self {
            schema: SCHEMA_STATE_V1_0.to_string(),
            health: health.into(),
            fw_version: None,
            uptime_seconds: 0,
            cpu_usage: -1.0,
            memory_usage: -1.0,
            temperature_c: TEMPERATURE_UNSET_C,
            custom_data: None,
            trace: None,
        }
    }

    pub fn encode(&self) -> CodecResult<String> {
        if self.health.is_empty() {
            return Err(CodecError::InvalidParam("health is empty".to_string()));
        }

        let mut map = envelope_map(&self.schema, self.trace.as_ref());
        map.insert("health".to_string(), Value::String(self.health.clone()));
        if let Some(fw) = self.fw_version.as_deref().filter(|fw| !fw.is_empty()) {
            map.insert("fw".to_string(), Value::String(fw.to_string()));
        }
        if self.uptime_seconds > 0 {
            map.insert("uptime_s".to_string(), Value::from(self.uptime_seconds));
        }
        if self.cpu_usage >= 0.0 {
            map.insert("cpu_usage".to_string(), Value::from(self.cpu_usage));
        }
        if self.memory_usage >= 0.0 {
            map.insert("memory_usage".to_string(), Value::from(self.memory_usage));
        }
        if self.temperature_c > TEMPERATURE_UNSET_C {
            map.insert("temperature_c".to_string(), Value::from(self.temperature_c));
        }
        if let Some(custom) = &self.custom_data {
            merge_custom(&mut map, custom);
        }

        Ok(Value::Object(map).to_string())
    }
}

/// Device event message.
#[derive(Debug, Clone, PartialEq)]
pub struct EventMessage {
    /// Event schema name, e.g. `evt.wifi.roam_miss/1.0`.
    pub schema: String,
    pub severity: Severity,
    pub sequence: i64,
    pub message: String,
    pub source: String,
    pub custom_data: Option<String>,
    pub trace: Option<TraceInfo>,
}

impl EventMessage {
    pub fn new(schema: impl Into<String>, severity: Severity) -> Self {
        Self {
            schema: schema.into(),
            severity,
            sequence: 0,
            message: String::new(),
            source: String::new(),
            custom_data: None,
            trace: None,
        }
    }

    pub fn encode(&self) -> CodecResult<String> {
        if self.schema.is_empty() {
            return Err(CodecError::InvalidParam("schema is empty".to_string()));
        }

        let mut map = envelope_map(&self.schema, self.trace.as_ref());
        map.insert("seq".to_string(), Value::from(self.sequence));
        map.insert(
            "severity".to_string(),
            Value::String(self.severity.as_str().to_string()),
        );
        map.insert("message".to_string(), Value::String(self.message.clone()));
        map.insert("source".to_string(), Value::String(self.source.clone()));
        if let Some(custom) = &self.custom_data {
            merge_custom(&mut map, custom);
        }

        Ok(Value::Object(map).to_string())
    }
}

/// Command request message.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandMessage {
    /// Command schema name, e.g. `cmd.diagnosis.get/1.0`.
    pub schema: String,
    pub id: String,
    pub operation: String,
    /// Argument object as JSON text; `None` encodes as `{}`.
    pub args: Option<String>,
    pub timeout_ms: i64,
    /// Expected reply kind: `ack`, `result`, or `none`.
    pub expect: String,
    /// Optional reply topic override.
    pub reply_to: Option<String>,
    pub trace: Option<TraceInfo>,
}

impl CommandMessage {
    pub fn new(
        schema: impl Into<String>,
        id: impl Into<String>,
        operation: impl Into<String>,
    ) -> Self {
        Self {
            schema: schema.into(),
            id: id.into(),
            operation: operation.into(),
            args: None,
            timeout_ms: 0,
            expect: "result".to_string(),
            reply_to: None,
            trace: None,
        }
    }

    pub fn encode(&self) -> CodecResult<String> {
        if self.id.is_empty() || self.operation.is_empty() {
            return Err(CodecError::InvalidParam(
                "command id and operation are required".to_string(),
            ));
        }

        let args: Value = match self.args.as_deref().filter(|a| !a.is_empty()) {
            Some(text) => serde_json::from_str(text)?,
            None => Value::Object(Map::new()),
        };

        let mut map = envelope_map(&self.schema, self.trace.as_ref());
        map.insert("id".to_string(), Value::String(self.id.clone()));
        map.insert("op".to_string(), Value::String(self.operation.clone()));
        map.insert("args".to_string(), args);
        map.insert("timeout_ms".to_string(), Value::from(self.timeout_ms));
        map.insert("expect".to_string(), Value::String(self.expect.clone()));
        if let Some(reply_to) = self.reply_to.as_deref().filter(|r| !r.is_empty()) {
            map.insert("reply_to".to_string(), Value::String(reply_to.to_string()));
        }

        Ok(Value::Object(map).to_string())
    }
}

/// Command response message.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandResponse {
    /// Identifier of the command being answered.
    pub id: String,
    pub ok: bool,
    /// Result object as JSON text; `None` encodes as `null`.
    pub result: Option<String>,
    pub progress: Option<String>,
    pub error_code: Option<String>,
    pub error_message: Option<String>,
    pub trace: Option<TraceInfo>,
}

impl CommandResponse {
    pub fn success(id: impl Into<String>, result: Option<String>) -> Self {
        Self {
            id: id.into(),
            ok: true,
            result,
            progress: None,
            error_code: None,
            error_message: None,
            trace: None,
        }
    }

    pub fn failure(
        id: impl Into<String>,
        error_code: impl Into<String>,
        error_message: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            ok: false,
            result: None,
            progress: None,
            error_code: Some(error_code.into()),
            error_message: Some(error_message.into()),
            trace: None,
        }
    }

    pub fn encode(&self) -> CodecResult<String> {
        if self.id.is_empty() {
            return Err(CodecError::InvalidParam("response id is empty".to_string()));
        }

        let result: Value = match self.result.as_deref().filter(|r| !r.is_empty()) {
            Some(text) => serde_json::from_str(text)?,
            None => Value::Null,
        };

        let mut map = Map::new();
        map.insert("id".to_string(), Value::String(self.id.clone()));
        map.insert("ts".to_string(), Value::from(current_timestamp_millis()));
        map.insert("ok".to_string(), Value::Bool(self.ok));
        map.insert("result".to_string(), result);
        if let Some(trace) = self.trace.as_ref().filter(|t| !t.is_empty()) {
            if let Ok(value) = serde_json::to_value(trace) {
                map.insert("trace".to_string(), value);
            }
        }
        if let Some(progress) = self.progress.as_deref().filter(|p| !p.is_empty()) {
            map.insert("progress".to_string(), Value::String(progress.to_string()));
        }
        if self.error_code.is_some() || self.error_message.is_some() {
            let mut err = Map::new();
            if let Some(code) = self.error_code.as_deref().filter(|c| !c.is_empty()) {
                err.insert("code".to_string(), Value::String(code.to_string()));
            }
            if let Some(msg) = self.error_message.as_deref().filter(|m| !m.is_empty()) {
                err.insert("msg".to_string(), Value::String(msg.to_string()));
            }
            if !err.is_empty() {
                map.insert("err".to_string(), Value::Object(err));
            }
        }

        Ok(Value::Object(map).to_string())
    }
}

/// Encode a Last-Will-Testament payload: `{status, ts, reason?}`.
///
/// LWT messages carry no schema field; the `lwt/1.0` definition requires
/// only `status` and `ts`.
pub fn encode_lwt(status: &str, reason: Option<&str>) -> CodecResult<String> {
    if status.is_empty() {
        return Err(CodecError::InvalidParam("status is empty".to_string()));
    }

    let mut map = Map::new();
    map.insert("status".to_string(), Value::String(status.to_string()));
    map.insert("ts".to_string(), Value::from(current_timestamp_millis()));
    if let Some(reason) = reason.filter(|r| !r.is_empty()) {
        map.insert("reason".to_string(), Value::String(reason.to_string()));
    }

    Ok(Value::Object(map).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_round_trip() {
        for severity in [
            Severity::Info,
            Severity::Warning,
            Severity::Error,
            Severity::Critical,
        ] {
            assert_eq!(Severity::from(severity.as_str()), severity);
        }
        assert_eq!(Severity::from("nonsense"), Severity::Info);
    }

    #[test]
    fn test_lwt_reason_optional() {
        let with_reason: Value =
            serde_json::from_str(&encode_lwt("offline", Some("power loss")).unwrap()).unwrap();
        assert_eq!(with_reason["status"], "offline");
        assert_eq!(with_reason["reason"], "power loss");

        let without: Value = serde_json::from_str(&encode_lwt("online", None).unwrap()).unwrap();
        assert!(without.get("reason").is_none());
    }
}
