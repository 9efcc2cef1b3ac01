//! Canonical built-in schema definitions.
//!
//! These are the protocol's core message schemas, registered by
//! `SchemaRegistry::register_builtin_schemas`. The validator enforces the
//! `required` and `const` declarations; the remaining structural constraints
//! document the wire format for consumers with full JSON Schema tooling.

use super::types::SchemaDefinition;

pub const SCHEMA_STATE_V1_0: &str = "state/1.0";
pub const SCHEMA_EVT_WIFI_ROAM_MISS_V1_0: &str = "evt.wifi.roam_miss/1.0";
pub const SCHEMA_LWT_V1_0: &str = "lwt/1.0";
pub const SCHEMA_CMD_DIAGNOSIS_GET_V1_0: &str = "cmd.diagnosis.get/1.0";

/// Device state message (state/1.0)
const STATE_V1_0_SCHEMA: &str = r#"{
  "$schema": "https://json-schema.org/draft/2020-12/schema",
  "title": "Device State Message v1.0",
  "type": "object",
  "required": ["schema", "ts", "health"],
  "properties": {
    "schema": {"const": "state/1.0"},
    "ts": {"type": "integer", "minimum": 0},
    "health": {"enum": ["ok", "warn", "error"]},
    "fw": {"type": "string"},
    "uptime_s": {"type": "integer", "minimum": 0},
    "cpu_usage": {"type": "number", "minimum": 0, "maximum": 100},
    "memory_usage": {"type": "number", "minimum": 0, "maximum": 100},
    "temperature_c": {"type": "number"},
    "trace": {
      "type": "object",
      "properties": {
        "req_id": {"type": "string"},
        "correlation_id": {"type": "string"},
        "span_id": {"type": "string"}
      }
    }
  },
  "additionalProperties": true
}"#;

/// WiFi roaming miss event (evt.wifi.roam_miss/1.0)
const WIFI_ROAM_MISS_V1_0_SCHEMA: &str = r#"{
  "$schema": "https://json-schema.org/draft/2020-12/schema",
  "title": "WiFi Roaming Miss Event v1.0",
  "type": "object",
  "required": ["schema", "ts", "severity", "trigger_info", "diagnosis"],
  "properties": {
    "schema": {"const": "evt.wifi.roam_miss/1.0"},
    "ts": {"type": "integer", "minimum": 0},
    "severity": {"enum": ["info", "warning", "error", "critical"]},
    "trigger_info": {
      "type": "object",
      "required": ["rssi_threshold", "duration_ms", "cooldown_ms"],
      "properties": {
        "rssi_threshold": {"type": "integer", "maximum": 0},
        "duration_ms": {"type": "integer", "const": 10000},
        "cooldown_ms": {"type": "integer", "const": 300000}
      }
    },
    "diagnosis": {
      "type": "object",
      "required": ["internal_scan_skip_count", "environment_ap_count", "current_bssid", "current_rssi"],
      "properties": {
        "internal_scan_skip_count": {"type": "integer", "minimum": 0},
        "environment_ap_count": {"type": "integer", "minimum": 0},
        "current_bssid": {"type": "string", "pattern": "^([0-9a-fA-F]{2}:){5}[0-9a-fA-F]{2}$"},
        "current_rssi": {"type": "integer", "minimum": -100, "maximum": 0}
      }
    }
  },
  "additionalProperties": true
}"#;

/// Last Will Testament message (lwt/1.0)
const LWT_V1_0_SCHEMA: &str = r#"{
  "$schema": "https://json-schema.org/draft/2020-12/schema",
  "title": "Last Will Testament Message v1.0",
  "type": "object",
  "required": ["status", "ts"],
  "properties": {
    "status": {"enum": ["online", "offline"]},
    "ts": {"type": "integer", "minimum": 0},
    "reason": {"type": "string"}
  },
  "additionalProperties": false
}"#;

/// Diagnosis get command (cmd.diagnosis.get/1.0)
const CMD_DIAGNOSIS_GET_V1_0_SCHEMA: &str = r#"{
  "$schema": "https://json-schema.org/draft/2020-12/schema",
  "title": "Diagnosis Get Command v1.0",
  "type": "object",
  "required": ["id", "op", "schema", "args"],
  "properties": {
    "id": {"type": "string", "minLength": 1},
    "op": {"const": "diagnosis.get"},
    "schema": {"const": "cmd.diagnosis.get/1.0"},
    "args": {
      "type": "object",
      "required": ["type"],
      "properties": {
        "type": {"enum": ["wifi", "system", "network", "hardware"]},
        "detail_level": {"enum": ["basic", "full"]},
        "include_history": {"type": "boolean"}
      }
    },
    "timeout_ms": {"type": "integer", "minimum": 1000, "maximum": 60000},
    "expect": {"enum": ["ack", "result", "none"]},
    "ts": {"type": "integer", "minimum": 0}
  },
  "additionalProperties": true
}"#;

/// The canonical definitions seeded into every registry.
pub(crate) fn builtin_definitions() -> Vec<SchemaDefinition> {
    vec![
        SchemaDefinition::new(
            SCHEMA_STATE_V1_0,
            "1.0",
            "Device state message with health status and metrics",
            STATE_V1_0_SCHEMA,
        ),
        SchemaDefinition::new(
            SCHEMA_EVT_WIFI_ROAM_MISS_V1_0,
            "1.0",
            "WiFi roaming miss event with diagnosis information",
            WIFI_ROAM_MISS_V1_0_SCHEMA,
        ),
        SchemaDefinition::new(
            SCHEMA_LWT_V1_0,
            "1.0",
            "Last Will Testament message for device online/offline status",
            LWT_V1_0_SCHEMA,
        ),
        SchemaDefinition::new(
            SCHEMA_CMD_DIAGNOSIS_GET_V1_0,
            "1.0",
            "Diagnosis get command for requesting device diagnostic data",
            CMD_DIAGNOSIS_GET_V1_0_SCHEMA,
        ),
    ]
}
