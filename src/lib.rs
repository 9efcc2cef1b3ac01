//! # rtklink
//!
//! A device-communication framework for heterogeneous IoT fleets. Devices
//! publish state, telemetry, and events, and receive commands, over a
//! pluggable publish/subscribe transport, using a versioned application-level
//! protocol: a canonical topic layout, a common JSON message envelope, and a
//! registry of named schemas.
//!
//! ## Features
//!
//! - **Canonical Topics**: Build and parse `rtk/v1/{tenant}/{site}/{device}/…`
//!   topic strings with round-trip guarantees and wildcard subscribe patterns
//! - **Message Envelopes**: JSON messages carrying `schema`, `ts`, and
//!   optional `trace` correlation fields, with per-type builders
//! - **Schema Validation**: Registry of versioned schema definitions with
//!   required-field and constant-value checking
//! - **Pluggable Backends**: Any transport implementing [`PubSubBackend`]
//!   can carry the protocol; the framework never talks to sockets directly
//! - **Device Plugins**: Trait-based device implementations, registered
//!   in-process or loaded from shared libraries over a C-ABI boundary
//!
//! ## Quick Start
//!
//! ```rust
//! use rtklink::{
//!     BrokerConfig, MemoryBackend, PubSubManager, QoS, StateMessage,
//!     TopicBuilder, TopicConfig,
//! };
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Topic construction
//!     let mut topics = TopicBuilder::new();
//!     topics.set_config(TopicConfig::new("acme", "hq", "sensor-01"))?;
//!     let topic = topics.build_telemetry("temperature")?;
//!
//!     // Message encoding
//!     let mut state = StateMessage::new("ok");
//!     state.uptime_seconds = 120;
//!     let payload = state.encode()?;
//!
//!     // Transport via a pluggable backend
//!     let mut manager = PubSubManager::new();
//!     manager.set_backend(Box::new(MemoryBackend::new()))?;
//!     manager.configure(BrokerConfig::new("localhost", 1883, "sensor-01"))?;
//!     manager.connect()?;
//!     manager.publish(&topic, payload.as_bytes(), QoS::AtLeastOnce, false)?;
//!
//!     Ok(())
//! }
//! ```

pub mod rtklink;

// Re-export the main API at crate root for easy access
pub use rtklink::codec::{
    current_timestamp_millis, decode_header, encode_generic, encode_lwt, generate_request_id,
    CodecError, CodecResult, CommandMessage, CommandResponse, EventMessage, MessageHeader,
    Severity, StateMessage, TraceInfo,
};
pub use rtklink::plugin::{
    DeviceInfo, DevicePlugin, PluginConfig, PluginError, PluginInstance, PluginManager,
    PluginResult,
};
pub use rtklink::pubsub::{
    BrokerConfig, ConnectionState, LwtConfig, MemoryBackend, PubSubBackend, PubSubError,
    PubSubManager, PubSubMessage, PubSubResult, QoS,
};
pub use rtklink::schema::{
    SchemaDefinition, SchemaError, SchemaRegistry, SchemaResult, ValidationResult,
};
pub use rtklink::topic::{
    parse_topic, topic_is_valid, ParsedTopic, SubscribePattern, TopicBuilder, TopicConfig,
    TopicError, TopicResult, TopicType,
};
