//! The common message envelope.
//!
//! Every message carries `schema` (a `type/major.minor` name), `ts` (epoch
//! milliseconds), and an optional `trace` object with correlation
//! identifiers. Per-type builders in [`super::messages`] compose this
//! envelope with their own field sets; `encode_generic` is the escape hatch
//! for application-defined message types.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::{CodecError, CodecResult};

/// Optional correlation identifiers propagated through command/response
/// flows. Only populated sub-fields are serialized.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub req_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span_id: Option<String>,
}

impl TraceInfo {
    pub fn with_req_id(req_id: impl Into<String>) -> Self {
        Self {
            req_id: Some(req_id.into()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.req_id.is_none() && self.correlation_id.is_none() && self.span_id.is_none()
    }
}

/// Envelope-level fields extracted by [`decode_header`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageHeader {
    pub schema: String,
    pub ts: i64,
    pub has_trace: bool,
}

/// Current Unix timestamp in milliseconds, the `ts` envelope field.
pub fn current_timestamp_millis() -> i64 {
    Utc::now().timestamp_millis()
}

static REQUEST_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Generate a request identifier unique within this process lifetime.
///
/// Combines the current timestamp with a monotonically increasing counter.
/// Callers needing uniqueness across processes or restarts must inject
/// their own identifiers.
pub fn generate_request_id() -> String {
    let counter = REQUEST_COUNTER.fetch_add(1, Ordering::Relaxed) + 1;
    format!("req-{}-{}", current_timestamp_millis(), counter)
}

/// Whether `name` matches the `type/major.minor` schema naming rule.
pub fn schema_name_is_valid(name: &str) -> bool {
    let Some((kind, version)) = name.split_once('/') else {
        return false;
    };
    if kind.is_empty() || kind.contains('/') || version.contains('/') {
        return false;
    }
    let Some((major, minor)) = version.split_once('.') else {
        return false;
    };
    let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    all_digits(major) && all_digits(minor)
}

/// Start an envelope map with `schema`, `ts`, and a populated `trace`.
pub(crate) fn envelope_map(schema: &str, trace: Option<&TraceInfo>) -> Map<String, Value> {
    let mut map = Map::new();
    map.insert("schema".to_string(), Value::String(schema.to_string()));
    map.insert("ts".to_string(), Value::from(current_timestamp_millis()));
    if let Some(trace) = trace {
        if !trace.is_empty() {
            // TraceInfo skips unset sub-fields in its Serialize impl
            if let Ok(value) = serde_json::to_value(trace) {
                map.insert("trace".to_string(), value);
            }
        }
    }
    map
}

/// Shallow-merge the top-level keys of `custom` into `map`.
///
/// Unparsable or non-object custom data skips the merge without failing the
/// message; the condition is surfaced through the log collector.
pub(crate) fn merge_custom(map: &mut Map<String, Value>, custom: &str) {
    if custom.is_empty() {
        return;
    }
    match serde_json::from_str::<Value>(custom) {
        Ok(Value::Object(fields)) => {
            for (key, value) in fields {
                map.insert(key, value);
            }
        }
        Ok(_) => warn!("custom data is not a JSON object, skipping merge"),
        Err(e) => warn!("failed to parse custom data as JSON, skipping merge: {}", e),
    }
}

/// Encode a generic envelope: `schema`, `ts`, optional `trace`, and the
/// top-level keys of an optional custom JSON object.
pub fn encode_generic(
    schema: &str,
    custom_json: Option<&str>,
    trace: Option<&TraceInfo>,
) -> CodecResult<String> {
    if schema.is_empty() {
        return Err(CodecError::InvalidParam("schema is empty".to_string()));
    }
    let mut map = envelope_map(schema, trace);
    if let Some(custom) = custom_json {
        merge_custom(&mut map, custom);
    }
    Ok(Value::Object(map).to_string())
}

/// Extract only the envelope-level fields from a message.
///
/// Tolerant of additional unknown fields for forward compatibility; absent
/// envelope fields decode to their zero values.
pub fn decode_header(json: &str) -> CodecResult<MessageHeader> {
    let value: Value = serde_json::from_str(json)?;
    Ok(MessageHeader {
        schema: value
            .get("schema")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        ts: value.get("ts").and_then(Value::as_i64).unwrap_or(0),
        has_trace: value.get("trace").is_some(),
    })
}

/// Get a top-level string field from a JSON message, or `None` when the
/// message is malformed or the field is absent or not a string.
pub fn extract_json_field(json: &str, field_name: &str) -> Option<String> {
    serde_json::from_str::<Value>(json)
        .ok()?
        .get(field_name)?
        .as_str()
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_ids_are_unique() {
        let a = generate_request_id();
        let b = generate_request_id();
        assert_ne!(a, b);
        assert!(a.starts_with("req-"));
    }

    #[test]
    fn test_schema_name_format() {
        assert!(schema_name_is_valid("state/1.0"));
        assert!(schema_name_is_valid("evt.wifi.roam_miss/1.0"));
        assert!(!schema_name_is_valid("state"));
        assert!(!schema_name_is_valid("/1.0"));
        assert!(!schema_name_is_valid("state/1"));
        assert!(!schema_name_is_valid("state/a.b"));
        assert!(!schema_name_is_valid("state/1.0/extra"));
    }

    #[test]
    fn test_merge_skips_non_object_custom() {
        let mut map = envelope_map("state/1.0", None);
        let before = map.len();
        merge_custom(&mut map, "[1,2,3]");
        merge_custom(&mut map, "not json");
        assert_eq!(map.len(), before);
    }
}
