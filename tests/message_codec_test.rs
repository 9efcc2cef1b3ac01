use rtklink::{
    decode_header, encode_generic, encode_lwt, generate_request_id, CommandMessage,
    CommandResponse, EventMessage, Severity, StateMessage, TraceInfo,
};
use serde_json::Value;

fn parse(json: &str) -> Value {
    serde_json::from_str(json).expect("encoder must produce valid JSON")
}

#[test]
fn test_state_message_envelope_fields() {
    let json = parse(&StateMessage::new("ok").encode().unwrap());
    assert_eq!(json["schema"], "state/1.0");
    assert_eq!(json["health"], "ok");
    assert!(json["ts"].as_i64().unwrap() > 0);
    assert!(json.get("trace").is_none());
}

#[test]
fn test_state_message_omits_unset_numerics() {
    let mut message = StateMessage::new("ok");
    message.uptime_seconds = 0;
    let json = parse(&message.encode().unwrap());
    assert!(json.get("uptime_s").is_none());
    assert!(json.get("cpu_usage").is_none());
    assert!(json.get("memory_usage").is_none());
    assert!(json.get("temperature_c").is_none());
    assert!(json.get("fw").is_none());
}

#[test]
fn test_state_message_includes_set_numerics() {
    let mut message = StateMessage::new("warn");
    message.uptime_seconds = 120;
    message.cpu_usage = 55.5;
    message.memory_usage = 0.0;
    message.temperature_c = 36.5;
    message.fw_version = Some("2.1.0".to_string());
    let json = parse(&message.encode().unwrap());
    assert_eq!(json["uptime_s"], 120);
    assert_eq!(json["cpu_usage"], 55.5);
    assert_eq!(json["memory_usage"], 0.0);
    assert_eq!(json["temperature_c"], 36.5);
    assert_eq!(json["fw"], "2.1.0");
}

#[test]
fn test_custom_data_shallow_merge() {
    let mut message = StateMessage::new("ok");
    message.custom_data = Some(r#"{"rssi":-42,"nested":{"a":1}}"#.to_string());
    let json = parse(&message.encode().unwrap());
    assert_eq!(json["rssi"], -42);
    assert_eq!(json["nested"]["a"], 1);
    assert_eq!(json["health"], "ok");
}

#[test]
fn test_bad_custom_data_is_not_fatal() {
    let mut message = StateMessage::new("ok");
    message.custom_data = Some("{{{not json".to_string());
    let json = parse(&message.encode().unwrap());
    assert_eq!(json["health"], "ok");

    message.custom_data = Some("[1,2,3]".to_string());
    let json = parse(&message.encode().unwrap());
    assert_eq!(json["schema"], "state/1.0");
}

#[test]
fn test_trace_serializes_only_populated_fields() {
    let mut message = StateMessage::new("ok");
    message.trace = Some(TraceInfo::with_req_id("req-1"));
    let json = parse(&message.encode().unwrap());
    assert_eq!(json["trace"]["req_id"], "req-1");
    assert!(json["trace"].get("correlation_id").is_none());
    assert!(json["trace"].get("span_id").is_none());

    // An all-empty trace is omitted entirely
    message.trace = Some(TraceInfo::default());
    let json = parse(&message.encode().unwrap());
    assert!(json.get("trace").is_none());
}

#[test]
fn test_event_message_fields() {
    let mut event = EventMessage::new("evt.wifi.roam_miss/1.0", Severity::Warning);
    event.sequence = 7;
    event.message = "roaming miss detected".to_string();
    event.source = "wifi-monitor".to_string();
    let json = parse(&event.encode().unwrap());
    assert_eq!(json["schema"], "evt.wifi.roam_miss/1.0");
    assert_eq!(json["seq"], 7);
    assert_eq!(json["severity"], "warning");
    assert_eq!(json["message"], "roaming miss detected");
    assert_eq!(json["source"], "wifi-monitor");
}

#[test]
fn test_command_message_fields() {
    let mut command = CommandMessage::new("cmd.diagnosis.get/1.0", "cmd-1", "diagnosis.get");
    command.args = Some(r#"{"type":"wifi"}"#.to_string());
    command.timeout_ms = 5000;
    command.expect = "result".to_string();
    command.reply_to = Some("rtk/v1/acme/hq/ctrl/cmd/res".to_string());
    let json = parse(&command.encode().unwrap());
    assert_eq!(json["id"], "cmd-1");
    assert_eq!(json["op"], "diagnosis.get");
    assert_eq!(json["schema"], "cmd.diagnosis.get/1.0");
    assert_eq!(json["args"]["type"], "wifi");
    assert_eq!(json["timeout_ms"], 5000);
    assert_eq!(json["expect"], "result");
    assert_eq!(json["reply_to"], "rtk/v1/acme/hq/ctrl/cmd/res");
}

#[test]
fn test_command_message_defaults_and_errors() {
    let command = CommandMessage::new("cmd.reboot/1.0", "cmd-2", "reboot");
    let json = parse(&command.encode().unwrap());
    assert!(json["args"].as_object().unwrap().is_empty());
    assert!(json.get("reply_to").is_none());

    let mut bad = CommandMessage::new("cmd.reboot/1.0", "cmd-3", "reboot");
    bad.args = Some("not json".to_string());
    assert!(bad.encode().is_err());

    assert!(CommandMessage::new("cmd.reboot/1.0", "", "reboot").encode().is_err());
}

#[test]
fn test_command_response_success_and_failure() {
    let json = parse(
        &CommandResponse::success("cmd-1", Some(r#"{"status":"done"}"#.to_string()))
            .encode()
            .unwrap(),
    );
    assert_eq!(json["id"], "cmd-1");
    assert_eq!(json["ok"], true);
    assert_eq!(json["result"]["status"], "done");
    assert!(json.get("err").is_none());

    let json = parse(
        &CommandResponse::failure("cmd-2", "E_TIMEOUT", "device did not answer")
            .encode()
            .unwrap(),
    );
    assert_eq!(json["ok"], false);
    assert!(json["result"].is_null());
    assert_eq!(json["err"]["code"], "E_TIMEOUT");
    assert_eq!(json["err"]["msg"], "device did not answer");
}

#[test]
fn test_lwt_message() {
    let json = parse(&encode_lwt("offline", Some("connection lost")).unwrap());
    assert_eq!(json["status"], "offline");
    assert_eq!(json["reason"], "connection lost");
    assert!(json.get("schema").is_none());
    assert!(encode_lwt("", None).is_err());
}

#[test]
fn test_generic_envelope() {
    let trace = TraceInfo {
        req_id: Some("r".to_string()),
        correlation_id: Some("c".to_string()),
        span_id: None,
    };
    let json = parse(&encode_generic("attr/1.0", Some(r#"{"model":"gw-7"}"#), Some(&trace)).unwrap());
    assert_eq!(json["schema"], "attr/1.0");
    assert_eq!(json["model"], "gw-7");
    assert_eq!(json["trace"]["correlation_id"], "c");
    assert!(encode_generic("", None, None).is_err());
}

#[test]
fn test_decode_header_is_forward_compatible() {
    let header = decode_header(
        r#"{"schema":"state/1.0","ts":1700000000000,"trace":{"req_id":"r"},"future_field":[1,2]}"#,
    )
    .unwrap();
    assert_eq!(header.schema, "state/1.0");
    assert_eq!(header.ts, 1_700_000_000_000);
    assert!(header.has_trace);

    let header = decode_header(r#"{"health":"ok"}"#).unwrap();
    assert_eq!(header.schema, "");
    assert_eq!(header.ts, 0);
    assert!(!header.has_trace);

    assert!(decode_header("not json").is_err());
}

#[test]
fn test_request_ids_unique_within_process() {
    let mut ids: Vec<String> = (0..100).map(|_| generate_request_id()).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 100);
}

#[test]
fn test_extract_json_field() {
    use rtklink::rtklink::codec::extract_json_field;

    let json = r#"{"schema":"state/1.0","ts":1,"health":"ok"}"#;
    assert_eq!(extract_json_field(json, "health").as_deref(), Some("ok"));
    // Absent, non-string, and malformed inputs all answer None
    assert_eq!(extract_json_field(json, "missing"), None);
    assert_eq!(extract_json_field(json, "ts"), None);
    assert_eq!(extract_json_field("junk", "health"), None);
}

#[test]
fn test_severity_string_conversion() {
    assert_eq!(Severity::Critical.as_str(), "critical");
    assert_eq!(Severity::from("warning"), Severity::Warning);
    assert_eq!(Severity::from("error"), Severity::Error);
    // Unknown strings decode to the safe default, not an error
    assert_eq!(Severity::from("catastrophic"), Severity::Info);
}
