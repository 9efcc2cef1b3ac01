//! Message envelope encoding and decoding.
//!
//! Builds and parses the common JSON envelope (`schema`, `ts`, optional
//! `trace`) and the type-specific payloads layered on top of it.

pub mod envelope;
pub mod error;
pub mod messages;

pub use envelope::{
    current_timestamp_millis, decode_header, encode_generic, extract_json_field,
    generate_request_id, schema_name_is_valid, MessageHeader, TraceInfo,
};
pub use error::{CodecError, CodecResult};
pub use messages::{
    encode_lwt, CommandMessage, CommandResponse, EventMessage, Severity, StateMessage,
    TEMPERATURE_UNSET_C,
};
